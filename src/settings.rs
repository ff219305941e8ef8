use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::{broadcast, RwLock};

use crate::similarity::DEFAULT_SIMILARITY_THRESHOLD;
use crate::timer::{TimerMode, TimerState, DEFAULT_BREAK_MINUTES, DEFAULT_FOCUS_MINUTES};

/// The persisted extension settings shared by the popup and every content script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub allow_list_terms: Vec<String>,
    pub suppress_short_form: bool,
    pub extension_enabled: bool,
    pub similarity_threshold: f64,
    pub timer_running: bool,
    pub timer_mode: TimerMode,
    pub focus_minutes: u32,
    pub break_minutes: u32,
    pub seconds_remaining: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            allow_list_terms: Vec::new(),
            suppress_short_form: true,
            extension_enabled: true,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            timer_running: false,
            timer_mode: TimerMode::Focus,
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            seconds_remaining: 0,
        }
    }
}

impl Configuration {
    /// Allow-list terms joined into the single query document.
    pub fn query_text(&self) -> String {
        self.allow_list_terms.join(" ")
    }

    /// Stored threshold, or the default when it is unset (zero), NaN or above one.
    pub fn effective_threshold(&self) -> f64 {
        let threshold = self.similarity_threshold;
        if threshold > 0.0 && threshold <= 1.0 {
            threshold
        } else {
            DEFAULT_SIMILARITY_THRESHOLD
        }
    }

    /// Timer as last persisted. A zero countdown means "full phase".
    pub fn timer_state(&self) -> TimerState {
        let mut state = TimerState {
            running: self.timer_running,
            mode: self.timer_mode,
            seconds_remaining: self.seconds_remaining,
            focus_minutes: self.focus_minutes,
            break_minutes: self.break_minutes,
        };
        if state.seconds_remaining == 0 {
            state.seconds_remaining = state.phase_seconds(state.mode);
        }
        state
    }

    pub fn apply_timer(&mut self, timer: &TimerState) {
        self.timer_running = timer.running;
        self.timer_mode = timer.mode;
        self.seconds_remaining = timer.seconds_remaining;
        self.focus_minutes = timer.focus_minutes;
        self.break_minutes = timer.break_minutes;
    }
}

/// Broadcast after every successful write that changed something.
#[derive(Debug, Clone)]
pub struct StorageChange {
    pub old: Configuration,
    pub new: Configuration,
}

impl StorageChange {
    pub fn changed_keys(&self) -> Vec<&'static str> {
        let (old, new) = (&self.old, &self.new);
        let mut keys = Vec::new();
        if old.allow_list_terms != new.allow_list_terms {
            keys.push("allowListTerms");
        }
        if old.suppress_short_form != new.suppress_short_form {
            keys.push("suppressShortForm");
        }
        if old.extension_enabled != new.extension_enabled {
            keys.push("extensionEnabled");
        }
        if old.similarity_threshold != new.similarity_threshold {
            keys.push("similarityThreshold");
        }
        if old.timer_running != new.timer_running {
            keys.push("timerRunning");
        }
        if old.timer_mode != new.timer_mode {
            keys.push("timerMode");
        }
        if old.focus_minutes != new.focus_minutes {
            keys.push("focusMinutes");
        }
        if old.break_minutes != new.break_minutes {
            keys.push("breakMinutes");
        }
        if old.seconds_remaining != new.seconds_remaining {
            keys.push("secondsRemaining");
        }
        keys
    }

    /// Whether the run state, phase or enabled flag was written.
    pub fn affects_timer(&self) -> bool {
        self.changed_keys()
            .iter()
            .any(|key| matches!(*key, "extensionEnabled" | "timerRunning" | "timerMode"))
    }

    /// Whether the page needs a new reconciliation pass. Countdown
    /// checkpoints and phase lengths alone do not.
    pub fn affects_page(&self) -> bool {
        self.changed_keys().iter().any(|key| {
            matches!(
                *key,
                "allowListTerms"
                    | "suppressShortForm"
                    | "extensionEnabled"
                    | "similarityThreshold"
                    | "timerRunning"
                    | "timerMode"
            )
        })
    }
}

pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<Configuration>,
    changes: broadcast::Sender<StorageChange>,
}

impl SettingsStore {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unreadable as JSON.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed settings in {}: {err}", path.display());
                Configuration::default()
            })
        } else {
            Configuration::default()
        };

        Ok(Self::with_data(Some(path), data))
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self::with_data(None, Configuration::default())
    }

    pub fn in_memory_with(data: Configuration) -> Self {
        Self::with_data(None, data)
    }

    fn with_data(path: Option<PathBuf>, data: Configuration) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            path,
            data: RwLock::new(data),
            changes,
        }
    }

    pub async fn get(&self) -> Configuration {
        self.data.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }

    /// Apply `mutate` to a copy of the settings and persist it. The in-memory
    /// copy only changes once the write succeeded; subscribers are notified
    /// when something actually changed.
    pub async fn update<F>(&self, mutate: F) -> Result<Configuration>
    where
        F: FnOnce(&mut Configuration),
    {
        let mut guard = self.data.write().await;
        let mut next = guard.clone();
        mutate(&mut next);

        if next == *guard {
            return Ok(next);
        }

        self.persist(&next).await?;
        let old = std::mem::replace(&mut *guard, next.clone());
        drop(guard);

        // No subscribers is fine; the popup may be the only party alive.
        let _ = self.changes.send(StorageChange {
            old,
            new: next.clone(),
        });
        Ok(next)
    }

    async fn persist(&self, data: &Configuration) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let serialized = serde_json::to_string_pretty(data)?;
        tokio::fs::write(path, serialized)
            .await
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Configuration =
            serde_json::from_str(r#"{"allowListTerms":["chess"],"timerMode":"break"}"#).unwrap();
        assert_eq!(config.allow_list_terms, vec!["chess"]);
        assert_eq!(config.timer_mode, TimerMode::Break);
        assert!(config.suppress_short_form);
        assert!(config.extension_enabled);
        assert_eq!(config.similarity_threshold, 0.6);
        assert_eq!(config.focus_minutes, 25);
        assert_eq!(config.break_minutes, 5);
    }

    #[test]
    fn serializes_camel_case_keys() {
        let value = serde_json::to_value(Configuration::default()).unwrap();
        for key in [
            "allowListTerms",
            "suppressShortForm",
            "extensionEnabled",
            "similarityThreshold",
            "timerRunning",
            "timerMode",
            "focusMinutes",
            "breakMinutes",
            "secondsRemaining",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn query_joins_terms_with_spaces() {
        let config = Configuration {
            allow_list_terms: vec!["rust".into(), "chess openings".into()],
            ..Configuration::default()
        };
        assert_eq!(config.query_text(), "rust chess openings");
    }

    #[test]
    fn out_of_range_threshold_uses_default() {
        let mut config = Configuration::default();
        config.similarity_threshold = 0.25;
        assert_eq!(config.effective_threshold(), 0.25);
        config.similarity_threshold = 1.5;
        assert_eq!(config.effective_threshold(), 0.6);
        config.similarity_threshold = f64::NAN;
        assert_eq!(config.effective_threshold(), 0.6);
    }

    #[test]
    fn zero_threshold_counts_as_unset() {
        let config = Configuration {
            similarity_threshold: 0.0,
            ..Configuration::default()
        };
        assert_eq!(config.effective_threshold(), 0.6);

        let config = Configuration {
            similarity_threshold: -0.2,
            ..Configuration::default()
        };
        assert_eq!(config.effective_threshold(), 0.6);
    }

    #[test]
    fn zero_countdown_reads_as_full_phase() {
        let config = Configuration {
            timer_mode: TimerMode::Break,
            break_minutes: 10,
            ..Configuration::default()
        };
        assert_eq!(config.timer_state().seconds_remaining, 600);
    }

    #[test]
    fn countdown_checkpoint_does_not_affect_page() {
        let old = Configuration::default();
        let mut new = old.clone();
        new.seconds_remaining = 300;
        let change = StorageChange { old: old.clone(), new };
        assert_eq!(change.changed_keys(), vec!["secondsRemaining"]);
        assert!(!change.affects_page());

        let mut toggled = old.clone();
        toggled.extension_enabled = false;
        let change = StorageChange { old, new: toggled };
        assert!(change.affects_page());
    }

    #[test]
    fn timer_keys_are_tracked_separately() {
        let old = Configuration::default();
        let mut terms = old.clone();
        terms.allow_list_terms = vec!["chess".into()];
        assert!(!StorageChange { old: old.clone(), new: terms }.affects_timer());

        let mut phase = old.clone();
        phase.timer_mode = TimerMode::Break;
        assert!(StorageChange { old, new: phase }.affects_timer());
    }

    #[tokio::test]
    async fn update_persists_and_broadcasts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        let mut changes = store.subscribe();

        store
            .update(|config| config.allow_list_terms = vec!["chess".into()])
            .await
            .unwrap();

        let change = changes.recv().await.unwrap();
        assert_eq!(change.changed_keys(), vec!["allowListTerms"]);

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.get().await.allow_list_terms, vec!["chess"]);
    }

    #[tokio::test]
    async fn noop_update_is_not_broadcast() {
        let store = SettingsStore::in_memory();
        let mut changes = store.subscribe();
        store.update(|config| config.extension_enabled = true).await.unwrap();
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_write_keeps_last_known_good() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("settings.json");
        let store = SettingsStore::new(path).unwrap();

        let result = store.update(|config| config.extension_enabled = false).await;
        assert!(result.is_err());
        assert!(store.get().await.extension_enabled);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = SettingsStore::new(path).unwrap();
        let config = tokio::runtime::Runtime::new().unwrap().block_on(store.get());
        assert_eq!(config, Configuration::default());
    }
}
