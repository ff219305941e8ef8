pub mod controller;
pub mod state;

pub use controller::{TimerController, TimerEvent, TimerSnapshot};
pub use state::{
    format_clock, TickOutcome, TimerMode, TimerState, DEFAULT_BREAK_MINUTES, DEFAULT_FOCUS_MINUTES,
};
