use serde::Serialize;

use crate::page::StatusBadge;
use crate::settings::Configuration;
use crate::timer::TimerMode;

/// Everything one reconciliation pass needs, captured up front so a pass
/// never reads shared state halfway through.
#[derive(Debug, Clone, PartialEq)]
pub struct PassContext {
    pub enabled: bool,
    pub timer_running: bool,
    pub timer_mode: TimerMode,
    pub suppress_short_form: bool,
    pub allow_list_terms: Vec<String>,
    pub threshold: f64,
}

impl PassContext {
    pub fn from_config(config: &Configuration) -> Self {
        Self {
            enabled: config.extension_enabled,
            timer_running: config.timer_running,
            timer_mode: config.timer_mode,
            suppress_short_form: config.suppress_short_form,
            allow_list_terms: config.allow_list_terms.clone(),
            threshold: config.effective_threshold(),
        }
    }

    /// Override the timer and enabled flags, as an `updateTimer` message does.
    pub fn with_timer(mut self, timer_running: bool, timer_mode: TimerMode, enabled: bool) -> Self {
        self.timer_running = timer_running;
        self.timer_mode = timer_mode;
        self.enabled = enabled;
        self
    }

    pub fn query_text(&self) -> String {
        self.allow_list_terms.join(" ")
    }

    pub fn badge(&self) -> StatusBadge {
        StatusBadge::for_state(self.enabled, self.timer_running, self.timer_mode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OperatingState {
    /// Extension switched off: nothing is blurred, nothing is classified
    Disabled,
    /// Timer paused in break mode: nothing is blurred
    BreakIdle,
    Active,
}

impl OperatingState {
    pub fn derive(ctx: &PassContext) -> Self {
        if !ctx.enabled {
            OperatingState::Disabled
        } else if !ctx.timer_running && ctx.timer_mode == TimerMode::Break {
            OperatingState::BreakIdle
        } else {
            OperatingState::Active
        }
    }
}
