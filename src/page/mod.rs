//! Presentation surface the reconciler works against.
//!
//! A live browser document implements [`Page`] through its DOM bindings;
//! [`MemoryPage`] is a plain-data stand-in used by tests and the CLI.

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::timer::TimerMode;

pub use memory::{MemoryElement, MemoryPage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

/// Element categories the reconciler cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    /// A recommendable video tile (home feed, search result, sidebar)
    VideoItem,
    /// One short-form item
    ReelItem,
    /// A feed section; only some of them hold short-form content
    Shelf,
    /// The full-page short-form player
    ShortsPlayer,
    /// Side navigation entry
    GuideEntry,
    /// Bottom navigation entry on narrow layouts
    PivotBarItem,
}

pub trait Page: Send + 'static {
    fn query(&self, kind: ElementKind) -> Vec<NodeId>;

    /// Text of the node's title element, if it has one.
    fn title_text(&self, node: NodeId) -> Option<String>;

    fn text_content(&self, node: NodeId) -> String;

    fn has_marker(&self, node: NodeId) -> bool;

    /// Add or remove the suppression marker (blur).
    fn set_marker(&mut self, node: NodeId, on: bool);

    /// Every node currently carrying the suppression marker.
    fn marked(&self) -> Vec<NodeId>;

    fn is_hidden(&self, node: NodeId) -> bool;

    fn set_hidden(&mut self, node: NodeId, hidden: bool);

    /// Path component of the page location, e.g. `/shorts/abc`.
    fn location_path(&self) -> String;

    fn has_notice(&self) -> bool;

    fn show_notice(&mut self, text: &str);

    fn remove_notice(&mut self);

    /// Create the status badge, replacing any existing one.
    fn install_status_badge(&mut self);

    /// Restyle the badge. Returns false when no badge is installed.
    fn render_status_badge(&mut self, badge: &StatusBadge) -> bool;
}

const BADGE_ON_LABEL: &str = "YouTube Focus: On";
const BADGE_OFF_LABEL: &str = "YouTube Focus: Off";

/// Text and colors of the always-visible status badge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBadge {
    pub label: String,
    pub background: String,
    pub color: String,
}

impl StatusBadge {
    pub fn on() -> Self {
        Self {
            label: BADGE_ON_LABEL.into(),
            background: "#c00".into(),
            color: "white".into(),
        }
    }

    pub fn off() -> Self {
        Self {
            label: BADGE_OFF_LABEL.into(),
            background: "#999".into(),
            color: "white".into(),
        }
    }

    /// Shown once the extension context is gone.
    pub fn refresh_prompt() -> Self {
        Self {
            label: "Please refresh page".into(),
            background: "#f44336".into(),
            color: "white".into(),
        }
    }

    /// Off whenever the extension is disabled or a break is running.
    pub fn for_state(enabled: bool, timer_running: bool, timer_mode: TimerMode) -> Self {
        match (enabled, timer_running, timer_mode) {
            (false, _, _) => Self::off(),
            (true, true, TimerMode::Break) => Self::off(),
            (true, _, _) => Self::on(),
        }
    }

    pub fn is_on(&self) -> bool {
        self.label == BADGE_ON_LABEL
    }
}
