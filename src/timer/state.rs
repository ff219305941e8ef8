use serde::{Deserialize, Serialize};

pub const DEFAULT_FOCUS_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

/// `secondsRemaining` is persisted whenever the countdown lands on a multiple of this.
const CHECKPOINT_EVERY_SECS: u32 = 15;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    #[default]
    Focus,
    Break,
}

impl TimerMode {
    pub fn other(self) -> Self {
        match self {
            TimerMode::Focus => TimerMode::Break,
            TimerMode::Break => TimerMode::Focus,
        }
    }
}

/// `MM:SS`, minutes allowed past 99.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// What a single one-second tick did to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer is paused; nothing changed
    Idle,
    Counting { seconds_remaining: u32 },
    /// Countdown reached a persistence checkpoint
    Checkpoint { seconds_remaining: u32 },
    /// Phase finished; the timer switched to `mode` and refilled
    PhaseChanged { mode: TimerMode, seconds_remaining: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub running: bool,
    pub mode: TimerMode,
    pub seconds_remaining: u32,
    pub focus_minutes: u32,
    pub break_minutes: u32,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            running: false,
            mode: TimerMode::Focus,
            seconds_remaining: DEFAULT_FOCUS_MINUTES * 60,
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full length of `mode` in seconds.
    pub fn phase_seconds(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Focus => self.focus_minutes * 60,
            TimerMode::Break => self.break_minutes * 60,
        }
    }

    /// Pause a running timer, or start a paused one. An exhausted countdown is
    /// refilled with the current phase length before starting.
    pub fn toggle(&mut self) {
        if self.running {
            self.running = false;
            return;
        }
        if self.seconds_remaining == 0 {
            self.seconds_remaining = self.phase_seconds(self.mode);
        }
        self.running = true;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }

        if self.seconds_remaining == 0 {
            self.mode = self.mode.other();
            self.seconds_remaining = self.phase_seconds(self.mode);
            return TickOutcome::PhaseChanged {
                mode: self.mode,
                seconds_remaining: self.seconds_remaining,
            };
        }

        self.seconds_remaining -= 1;
        if self.seconds_remaining % CHECKPOINT_EVERY_SECS == 0 {
            TickOutcome::Checkpoint {
                seconds_remaining: self.seconds_remaining,
            }
        } else {
            TickOutcome::Counting {
                seconds_remaining: self.seconds_remaining,
            }
        }
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.mode = TimerMode::Focus;
        self.seconds_remaining = self.phase_seconds(TimerMode::Focus);
    }

    /// Change phase lengths. An idle countdown in the affected phase is
    /// refilled so the display matches the new length.
    pub fn set_durations(&mut self, focus_minutes: u32, break_minutes: u32) {
        let focus_changed = focus_minutes != self.focus_minutes;
        let break_changed = break_minutes != self.break_minutes;
        self.focus_minutes = focus_minutes;
        self.break_minutes = break_minutes;

        if self.running {
            return;
        }
        let refill = match self.mode {
            TimerMode::Focus => focus_changed,
            TimerMode::Break => break_changed,
        };
        if refill {
            self.seconds_remaining = self.phase_seconds(self.mode);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_with(seconds_remaining: u32) -> TimerState {
        TimerState {
            running: true,
            seconds_remaining,
            ..TimerState::default()
        }
    }

    #[test]
    fn clock_pads_minutes_and_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(25 * 60), "25:00");
        assert_eq!(format_clock(120 * 60 + 1), "120:01");
    }

    #[test]
    fn mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TimerMode::Break).unwrap(), "\"break\"");
        let mode: TimerMode = serde_json::from_str("\"focus\"").unwrap();
        assert_eq!(mode, TimerMode::Focus);
    }

    #[test]
    fn paused_timer_does_not_count() {
        let mut state = TimerState::new();
        assert_eq!(state.tick(), TickOutcome::Idle);
        assert_eq!(state.seconds_remaining, 25 * 60);
    }

    #[test]
    fn tick_counts_down_and_checkpoints_every_fifteen() {
        let mut state = running_with(17);
        assert_eq!(state.tick(), TickOutcome::Counting { seconds_remaining: 16 });
        assert_eq!(state.tick(), TickOutcome::Checkpoint { seconds_remaining: 15 });
    }

    #[test]
    fn exhausted_phase_switches_mode_and_refills() {
        let mut state = running_with(1);
        assert_eq!(state.tick(), TickOutcome::Checkpoint { seconds_remaining: 0 });
        assert_eq!(
            state.tick(),
            TickOutcome::PhaseChanged {
                mode: TimerMode::Break,
                seconds_remaining: 5 * 60
            }
        );
        assert!(state.running);
        assert_eq!(state.mode, TimerMode::Break);
    }

    #[test]
    fn toggle_refills_exhausted_countdown() {
        let mut state = TimerState {
            seconds_remaining: 0,
            mode: TimerMode::Break,
            ..TimerState::default()
        };
        state.toggle();
        assert!(state.running);
        assert_eq!(state.seconds_remaining, 5 * 60);

        state.toggle();
        assert!(!state.running);
        assert_eq!(state.seconds_remaining, 5 * 60);
    }

    #[test]
    fn reset_returns_to_full_focus_phase() {
        let mut state = TimerState {
            running: true,
            mode: TimerMode::Break,
            seconds_remaining: 42,
            focus_minutes: 50,
            break_minutes: 10,
        };
        state.reset();
        assert!(!state.running);
        assert_eq!(state.mode, TimerMode::Focus);
        assert_eq!(state.seconds_remaining, 50 * 60);
    }

    #[test]
    fn changing_current_phase_length_refills_only_when_idle() {
        let mut state = TimerState::new();
        state.set_durations(30, 5);
        assert_eq!(state.seconds_remaining, 30 * 60);

        state.set_durations(30, 10);
        assert_eq!(state.seconds_remaining, 30 * 60, "break change does not touch focus countdown");

        state.running = true;
        state.seconds_remaining = 99;
        state.set_durations(45, 10);
        assert_eq!(state.seconds_remaining, 99);
        assert_eq!(state.focus_minutes, 45);
    }
}
