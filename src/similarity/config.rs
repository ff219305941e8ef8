/// Threshold applied when the stored one is missing or unusable.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Tunables for the title classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Minimum cosine similarity for a title to stay visible
    pub threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl ClassifierConfig {
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }
}
