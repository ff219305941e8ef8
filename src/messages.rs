//! Popup ↔ content script message protocol.

use serde::{Deserialize, Serialize};

use crate::timer::TimerMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Message {
    /// Re-run reconciliation with the current settings
    #[serde(rename = "updateUI")]
    UpdateUi,
    /// Apply a new timer/enabled state, then reconcile
    #[serde(rename = "updateTimer", rename_all = "camelCase")]
    UpdateTimer {
        timer_running: bool,
        timer_mode: TimerMode,
        enabled: bool,
    },
    /// Placeholder for a future on-device model; always answered with `false`
    #[serde(rename = "getModelStatus")]
    GetModelStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_loaded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: Some(true),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn model_status(loaded: bool) -> Self {
        Self {
            model_loaded: Some(loaded),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }
}
