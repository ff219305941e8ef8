use thiserror::Error;

/// Failures at the boundary between a page and the extension.
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// The extension was reloaded while the page stayed open. Only a page
    /// refresh recovers from this.
    #[error("Extension context invalidated")]
    ContextInvalidated,

    #[error("Could not establish connection. Receiving end does not exist.")]
    NoReceiver,

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl ExtensionError {
    pub fn is_context_invalidated(&self) -> bool {
        matches!(self, ExtensionError::ContextInvalidated)
    }
}
