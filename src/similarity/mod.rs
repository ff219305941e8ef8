pub mod classifier;
pub mod config;
pub mod scoring;
pub mod tfidf;
pub mod tokenizer;

pub use classifier::{classify, Classifier, MatchReason, Verdict};
pub use config::{ClassifierConfig, DEFAULT_SIMILARITY_THRESHOLD};
pub use scoring::cosine_similarity;
pub use tfidf::{term_frequency, Corpus, TermVector};
pub use tokenizer::tokenize;
