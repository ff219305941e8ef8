use super::tfidf::TermVector;

/// Cosine similarity between two sparse vectors.
///
/// The dot product runs over the keys of `a`; each norm comes from its own
/// vector. Returns exactly 0.0 when either norm is zero. Negative idf weights
/// can push the result below zero and it is returned as-is.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    for (term, weight) in a {
        dot += weight * b.get(term).copied().unwrap_or(0.0);
        norm_a += weight * weight;
    }
    let norm_b: f64 = b.values().map(|weight| weight * weight).sum();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
