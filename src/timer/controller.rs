use std::{sync::Arc, time::Duration};

use anyhow::Result;
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time,
};

use crate::error::ExtensionError;
use crate::messages::Message;
use crate::runtime::ExtensionRuntime;

use super::state::{format_clock, TickOutcome, TimerMode, TimerState};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Host whose tabs get `updateTimer` notifications.
pub const TARGET_HOST: &str = "youtube.com";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub display: String,
}

impl From<TimerState> for TimerSnapshot {
    fn from(state: TimerState) -> Self {
        Self {
            display: format_clock(state.seconds_remaining),
            state,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    /// Started, paused or reset
    StateChanged(TimerState),
    Tick(TimerState),
    /// A phase ran out and the timer moved on to `mode`
    PhaseChanged { mode: TimerMode, title: &'static str },
}

/// The popup's focus/break countdown. Persists its fields through the shared
/// settings and tells every open tab when the phase or run state changes.
#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<TimerState>>,
    runtime: ExtensionRuntime,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
    events: broadcast::Sender<TimerEvent>,
}

impl TimerController {
    pub fn new(runtime: ExtensionRuntime) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            state: Arc::new(Mutex::new(TimerState::new())),
            runtime,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    /// Pick up the persisted timer. A timer that was running when the popup
    /// closed resumes ticking.
    pub async fn load(&self) -> Result<TimerSnapshot> {
        let config = self.runtime.storage()?.get().await;
        let restored = config.timer_state();
        {
            let mut state = self.state.lock().await;
            *state = restored.clone();
        }

        if restored.running {
            self.spawn_ticker().await;
        }
        Ok(TimerSnapshot::from(restored))
    }

    pub async fn get_state(&self) -> TimerState {
        self.state.lock().await.clone()
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::from(self.get_state().await)
    }

    /// Start or pause.
    pub async fn toggle(&self) -> Result<TimerState> {
        let snapshot = {
            let mut state = self.state.lock().await;
            state.toggle();
            state.clone()
        };

        if snapshot.running {
            self.spawn_ticker().await;
        } else {
            self.cancel_ticker().await;
        }

        self.publish(&snapshot).await?;
        let _ = self.events.send(TimerEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    /// Stop and go back to a full focus phase.
    pub async fn reset(&self) -> Result<TimerState> {
        self.cancel_ticker().await;
        let snapshot = {
            let mut state = self.state.lock().await;
            state.reset();
            state.clone()
        };

        self.publish(&snapshot).await?;
        let _ = self.events.send(TimerEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    /// Adopt new phase lengths in memory; the caller persists them.
    pub async fn set_durations(&self, focus_minutes: u32, break_minutes: u32) -> TimerState {
        let mut state = self.state.lock().await;
        state.set_durations(focus_minutes, break_minutes);
        state.clone()
    }

    /// Advance the countdown by one second.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let (outcome, snapshot) = {
            let mut state = self.state.lock().await;
            let outcome = state.tick();
            (outcome, state.clone())
        };

        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Counting { .. } => {
                let _ = self.events.send(TimerEvent::Tick(snapshot));
            }
            TickOutcome::Checkpoint { seconds_remaining } => {
                self.runtime
                    .storage()?
                    .update(|config| config.seconds_remaining = seconds_remaining)
                    .await?;
                let _ = self.events.send(TimerEvent::Tick(snapshot));
            }
            TickOutcome::PhaseChanged { mode, .. } => {
                let title = match mode {
                    TimerMode::Focus => "Time to focus!",
                    TimerMode::Break => "Take a break!",
                };
                log_info!(
                    "{} ({} minutes)",
                    title,
                    snapshot.phase_seconds(mode) / 60
                );
                self.publish(&snapshot).await?;
                let _ = self.events.send(TimerEvent::PhaseChanged { mode, title });
            }
        }

        Ok(outcome)
    }

    /// Persist the timer fields, then push the new state to every matching tab.
    async fn publish(&self, snapshot: &TimerState) -> Result<()> {
        let config = self
            .runtime
            .storage()?
            .update(|config| config.apply_timer(snapshot))
            .await?;
        self.notify_tabs(snapshot, config.extension_enabled).await;
        Ok(())
    }

    pub async fn notify_tabs(&self, snapshot: &TimerState, enabled: bool) {
        for tab in self.runtime.query_tabs(TARGET_HOST).await {
            let message = Message::UpdateTimer {
                timer_running: snapshot.running,
                timer_mode: snapshot.mode,
                enabled,
            };
            match self.runtime.send_message(tab, message).await {
                Ok(response) if response.is_success() => log_info!("Tab {} updated successfully", tab),
                Ok(response) => log_warn!("Tab {} rejected timer update: {:?}", tab, response.error),
                Err(err) => log_warn!("Could not communicate with tab {}: {}", tab, err),
            }
        }
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let controller = self.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let start = time::Instant::now() + tick_interval;
            let mut interval = time::interval_at(start, tick_interval);
            loop {
                interval.tick().await;
                match controller.tick().await {
                    Ok(TickOutcome::Idle) => break,
                    Ok(_) => {}
                    Err(err) if context_invalidated(&err) => {
                        log_warn!("Extension context invalidated; stopping timer");
                        break;
                    }
                    Err(err) => log_error!("Timer tick failed: {err:#}"),
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}

fn context_invalidated(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ExtensionError>()
        .is_some_and(ExtensionError::is_context_invalidated)
}
