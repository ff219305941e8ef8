use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{ElementKind, NodeId, Page, StatusBadge};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryElement {
    pub id: NodeId,
    pub kind: ElementKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub marked: bool,
}

/// Snapshot of a page that can be loaded from JSON and mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryPage {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub elements: Vec<MemoryElement>,
    #[serde(default)]
    pub notice: Option<String>,
    #[serde(default)]
    pub badge: Option<StatusBadge>,
}

impl MemoryPage {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid page snapshot")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page snapshot from {}", path.display()))?;
        Self::from_json(&contents)
    }

    fn next_id(&self) -> NodeId {
        let max = self.elements.iter().map(|el| el.id.0).max().unwrap_or(0);
        NodeId(max + 1)
    }

    /// Append an element, as a page insertion would.
    pub fn insert(&mut self, kind: ElementKind, title: Option<&str>, text: &str) -> NodeId {
        let id = self.next_id();
        self.elements.push(MemoryElement {
            id,
            kind,
            title: title.map(str::to_string),
            text: text.to_string(),
            hidden: false,
            marked: false,
        });
        id
    }

    pub fn add_video(&mut self, title: &str) -> NodeId {
        self.insert(ElementKind::VideoItem, Some(title), title)
    }

    pub fn element(&self, node: NodeId) -> Option<&MemoryElement> {
        self.elements.iter().find(|el| el.id == node)
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut MemoryElement> {
        self.elements.iter_mut().find(|el| el.id == node)
    }
}

impl Page for MemoryPage {
    fn query(&self, kind: ElementKind) -> Vec<NodeId> {
        self.elements
            .iter()
            .filter(|el| el.kind == kind)
            .map(|el| el.id)
            .collect()
    }

    fn title_text(&self, node: NodeId) -> Option<String> {
        self.element(node).and_then(|el| el.title.clone())
    }

    fn text_content(&self, node: NodeId) -> String {
        self.element(node).map(|el| el.text.clone()).unwrap_or_default()
    }

    fn has_marker(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|el| el.marked)
    }

    fn set_marker(&mut self, node: NodeId, on: bool) {
        if let Some(el) = self.element_mut(node) {
            el.marked = on;
        }
    }

    fn marked(&self) -> Vec<NodeId> {
        self.elements.iter().filter(|el| el.marked).map(|el| el.id).collect()
    }

    fn is_hidden(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|el| el.hidden)
    }

    fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        if let Some(el) = self.element_mut(node) {
            el.hidden = hidden;
        }
    }

    fn location_path(&self) -> String {
        self.path.clone()
    }

    fn has_notice(&self) -> bool {
        self.notice.is_some()
    }

    fn show_notice(&mut self, text: &str) {
        self.notice = Some(text.to_string());
    }

    fn remove_notice(&mut self) {
        self.notice = None;
    }

    fn install_status_badge(&mut self) {
        self.badge = Some(StatusBadge::default());
    }

    fn render_status_badge(&mut self, badge: &StatusBadge) -> bool {
        match self.badge.as_mut() {
            Some(current) => {
                *current = badge.clone();
                true
            }
            None => false,
        }
    }
}
