use serde::Serialize;

use super::config::ClassifierConfig;
use super::scoring::cosine_similarity;
use super::tfidf::{Corpus, TermVector};

/// Why a title ended up allowed or suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchReason {
    /// The query appears verbatim in the title
    Substring,
    /// Similarity reached the threshold
    Similar,
    /// Similarity fell short of the threshold
    BelowThreshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub allowed: bool,
    pub similarity: f64,
    pub reason: MatchReason,
}

impl Verdict {
    pub fn suppressed(&self) -> bool {
        !self.allowed
    }
}

/// Classifies titles of one candidate batch against the allow-list query.
///
/// The corpus is the batch itself plus the query, so a classifier is built
/// per pass and thrown away afterwards.
pub struct Classifier {
    corpus: Corpus,
    query: String,
    query_vector: TermVector,
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new<S: AsRef<str>>(titles: &[S], query: &str, config: ClassifierConfig) -> Self {
        let corpus = Corpus::build(titles, query);
        let query_vector = corpus.vectorize(query);
        Self {
            corpus,
            query: query.trim().to_lowercase(),
            query_vector,
            config,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    pub fn classify(&self, title: &str) -> Verdict {
        // An empty query is a substring of everything; with no allow-list
        // terms only the similarity path may allow a title.
        if !self.query.is_empty() && title.to_lowercase().contains(&self.query) {
            return Verdict {
                allowed: true,
                similarity: 1.0,
                reason: MatchReason::Substring,
            };
        }

        let similarity = cosine_similarity(&self.corpus.vectorize(title), &self.query_vector);
        if similarity >= self.config.threshold {
            Verdict {
                allowed: true,
                similarity,
                reason: MatchReason::Similar,
            }
        } else {
            Verdict {
                allowed: false,
                similarity,
                reason: MatchReason::BelowThreshold,
            }
        }
    }

    /// Classify every title of the batch, preserving order.
    pub fn classify_all<S: AsRef<str>>(&self, titles: &[S]) -> Vec<Verdict> {
        titles.iter().map(|title| self.classify(title.as_ref())).collect()
    }
}

/// One-shot classification of `title` against `query` using `corpus` as the batch.
pub fn classify<S: AsRef<str>>(title: &str, query: &str, threshold: f64, corpus: &[S]) -> Verdict {
    Classifier::new(corpus, query, ClassifierConfig::with_threshold(threshold)).classify(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_match_overrides_any_threshold() {
        let titles = ["amazing cat video", "stock market news"];
        let verdict = classify("amazing cat video", "cat", 1.0, &titles);
        assert!(verdict.allowed);
        assert_eq!(verdict.reason, MatchReason::Substring);
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let titles = ["Learn RUST in a weekend"];
        let verdict = classify("Learn RUST in a weekend", "Rust", 1.0, &titles);
        assert!(verdict.allowed);
    }

    #[test]
    fn unrelated_title_is_suppressed() {
        let titles = ["unrelated topic"];
        let verdict = classify("unrelated topic", "cooking recipes", 0.6, &titles);
        assert!(verdict.suppressed());
        assert_eq!(verdict.similarity, 0.0);
        assert_eq!(verdict.reason, MatchReason::BelowThreshold);
    }

    #[test]
    fn similarity_path_allows_overlapping_titles() {
        // "recipes" appears in the title but the full query does not.
        let titles = ["easy pasta recipes", "car crash compilation", "funny cat clips"];
        let classifier = Classifier::new(&titles, "pasta recipes", ClassifierConfig::with_threshold(0.5));
        let verdicts = classifier.classify_all(&titles);

        assert_eq!(verdicts[0].reason, MatchReason::Substring);
        assert!(verdicts[1].suppressed());
        assert!(verdicts[2].suppressed());

        let reordered = classifier.classify("Recipes: Pasta!");
        assert_eq!(reordered.reason, MatchReason::Similar);
        assert!((reordered.similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_query_does_not_allow_everything() {
        let titles = ["chess opening tricks", "funny cats compilation"];
        let classifier = Classifier::new(&titles, "", ClassifierConfig::default());
        for verdict in classifier.classify_all(&titles) {
            assert!(verdict.suppressed());
            assert_eq!(verdict.similarity, 0.0);
        }
    }

    #[test]
    fn default_threshold_is_point_six() {
        let classifier = Classifier::new(&["x"], "y", ClassifierConfig::default());
        assert_eq!(classifier.threshold(), 0.6);
    }
}
