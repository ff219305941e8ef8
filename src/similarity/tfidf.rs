use std::collections::{HashMap, HashSet};

use super::tokenizer::tokenize;

/// Sparse token → weight mapping.
pub type TermVector = HashMap<String, f64>;

/// Raw token counts for one document.
pub fn term_frequency(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

/// Document-frequency statistics over one batch of titles plus the user query.
///
/// Built from scratch on every reconciliation pass; nothing is carried over
/// between passes because the candidate set changes as the page loads.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    total_docs: usize,
    doc_freq: HashMap<String, usize>,
}

impl Corpus {
    /// Treats `documents ∪ {query}` as the corpus, so `total_docs` is `n + 1`.
    pub fn build<S: AsRef<str>>(documents: &[S], query: &str) -> Self {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        let all = documents.iter().map(AsRef::as_ref).chain(std::iter::once(query));
        for text in all {
            let unique: HashSet<String> = tokenize(text).into_iter().collect();
            for token in unique {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }

        Self {
            total_docs: documents.len() + 1,
            doc_freq,
        }
    }

    pub fn total_docs(&self) -> usize {
        self.total_docs
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.doc_freq.get(term).copied().unwrap_or(0)
    }

    /// `ln(N / (1 + df))`. Goes negative for a term present in every document;
    /// that is left unclamped.
    pub fn idf(&self, term: &str) -> f64 {
        let df = self.document_frequency(term) as f64;
        (self.total_docs as f64 / (1.0 + df)).ln()
    }

    /// Weight every token of `text` by `tf * idf`.
    pub fn vectorize(&self, text: &str) -> TermVector {
        term_frequency(text)
            .into_iter()
            .map(|(term, count)| {
                let weight = count as f64 * self.idf(&term);
                (term, weight)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn term_frequency_counts_repeats() {
        let tf = term_frequency("cat cat dog");
        assert_eq!(tf.get("cat"), Some(&2));
        assert_eq!(tf.get("dog"), Some(&1));
    }

    #[test]
    fn query_counts_as_a_document() {
        let corpus = Corpus::build(&["chess opening tricks", "funny cats compilation"], "chess");
        assert_eq!(corpus.total_docs(), 3);
        assert_eq!(corpus.document_frequency("chess"), 2);
        assert_eq!(corpus.document_frequency("funny"), 1);
        assert_eq!(corpus.document_frequency("missing"), 0);
    }

    #[test]
    fn document_frequency_uses_token_sets() {
        let corpus = Corpus::build(&["cat cat cat"], "");
        assert_eq!(corpus.document_frequency("cat"), 1);
    }

    #[test]
    fn idf_follows_smoothed_formula() {
        let corpus = Corpus::build(&["chess opening tricks", "funny cats compilation"], "chess");
        assert!(approx(corpus.idf("chess"), (3.0f64 / 3.0).ln()));
        assert!(approx(corpus.idf("funny"), (3.0f64 / 2.0).ln()));
    }

    #[test]
    fn term_in_every_document_has_non_positive_idf() {
        let corpus = Corpus::build(&["rust tips", "rust tricks"], "rust");
        // df = n + 1 = 3, so ln(3 / 4) < 0
        assert!(corpus.idf("rust") <= 0.0);
        assert!(approx(corpus.idf("rust"), (3.0f64 / 4.0).ln()));
    }

    #[test]
    fn vectorize_multiplies_tf_by_idf() {
        let corpus = Corpus::build(&["cat cat video", "dog video"], "bird");
        let vector = corpus.vectorize("cat cat video");
        assert!(approx(vector["cat"], 2.0 * (3.0f64 / 2.0).ln()));
        assert!(approx(vector["video"], (3.0f64 / 3.0).ln()));
    }

    #[test]
    fn vectorize_empty_text_is_empty() {
        let corpus = Corpus::build(&["cat video"], "");
        assert!(corpus.vectorize("").is_empty());
    }
}
