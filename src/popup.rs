//! Settings form behind the toolbar popup.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::runtime::ExtensionRuntime;
use crate::timer::{format_clock, TimerController, DEFAULT_BREAK_MINUTES, DEFAULT_FOCUS_MINUTES};

const MAX_FOCUS_MINUTES: u32 = 120;
const MAX_BREAK_MINUTES: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinutesField {
    Focus,
    Break,
}

impl MinutesField {
    fn default_minutes(self) -> u32 {
        match self {
            MinutesField::Focus => DEFAULT_FOCUS_MINUTES,
            MinutesField::Break => DEFAULT_BREAK_MINUTES,
        }
    }

    fn max_minutes(self) -> u32 {
        match self {
            MinutesField::Focus => MAX_FOCUS_MINUTES,
            MinutesField::Break => MAX_BREAK_MINUTES,
        }
    }
}

/// Parse a minutes input. Non-numbers and values below one fall back to the
/// field default; large values are capped.
pub fn validate_minutes(raw: &str, field: MinutesField) -> u32 {
    match raw.trim().parse::<i64>() {
        Ok(value) if value >= 1 => (value.min(field.max_minutes() as i64)) as u32,
        _ => field.default_minutes(),
    }
}

/// Countdown text shown in the popup.
pub fn format_time(seconds: u32) -> String {
    format_clock(seconds)
}

/// One keyword per line; blank lines and repeats are dropped.
pub fn parse_allow_list(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for line in text.lines() {
        let term = line.trim();
        if !term.is_empty() && !terms.iter().any(|existing| existing == term) {
            terms.push(term.to_string());
        }
    }
    terms
}

/// Raw form values as the popup inputs hold them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsForm {
    pub allow_list: String,
    pub suppress_short_form: bool,
    pub extension_enabled: bool,
    pub focus_minutes: String,
    pub break_minutes: String,
}

pub struct Popup {
    runtime: ExtensionRuntime,
    timer: TimerController,
}

impl Popup {
    pub fn new(runtime: ExtensionRuntime) -> Self {
        let timer = TimerController::new(runtime.clone());
        Self { runtime, timer }
    }

    pub fn timer(&self) -> &TimerController {
        &self.timer
    }

    /// Fill the form from storage and resume a running timer.
    pub async fn load(&self) -> Result<SettingsForm> {
        let config = self.runtime.storage()?.get().await;
        self.timer.load().await?;

        Ok(SettingsForm {
            allow_list: config.allow_list_terms.join("\n"),
            suppress_short_form: config.suppress_short_form,
            extension_enabled: config.extension_enabled,
            focus_minutes: config.focus_minutes.to_string(),
            break_minutes: config.break_minutes.to_string(),
        })
    }

    /// Write every field, together with the current timer, then tell open tabs.
    pub async fn save(&self, form: &SettingsForm) -> Result<()> {
        let focus_minutes = validate_minutes(&form.focus_minutes, MinutesField::Focus);
        let break_minutes = validate_minutes(&form.break_minutes, MinutesField::Break);
        let timer = self.timer.set_durations(focus_minutes, break_minutes).await;
        let allow_list = parse_allow_list(&form.allow_list);

        let saved = self
            .runtime
            .storage()?
            .update(|config| {
                config.allow_list_terms = allow_list;
                config.suppress_short_form = form.suppress_short_form;
                config.extension_enabled = form.extension_enabled;
                config.apply_timer(&timer);
            })
            .await?;

        log::info!("Settings saved!");
        self.timer.notify_tabs(&timer, saved.extension_enabled).await;
        Ok(())
    }
}
