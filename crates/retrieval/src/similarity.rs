//! Cosine similarity and full-corpus ranking.

use std::cmp::Ordering;

use crate::corpus::{CorpusEntry, CorpusStore};

/// Cosine similarity between two vectors.
///
/// Accumulates in f64 and clamps to [-1, 1]. Returns 0.0 when the lengths
/// differ, either side is empty, or either norm is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = f64::from(*x);
        let y = f64::from(*y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom).clamp(-1.0, 1.0) as f32
}

/// A corpus entry paired with its similarity to one query.
#[derive(Debug, Clone, Copy)]
pub struct ScoredEntry<'a> {
    pub entry: &'a CorpusEntry,
    /// Index of the entry in corpus insertion order.
    pub position: usize,
    pub similarity: f32,
}

/// Score every corpus entry against `query`, most similar first.
///
/// The sort is stable, so equal scores keep corpus insertion order. Nothing
/// is filtered or truncated; the budget walk decides how much is used.
pub fn rank<'a>(corpus: &'a CorpusStore, query: &[f32]) -> Vec<ScoredEntry<'a>> {
    let mut scored: Vec<ScoredEntry<'a>> = corpus
        .entries()
        .iter()
        .enumerate()
        .map(|(position, entry)| ScoredEntry {
            entry,
            position,
            similarity: cosine_similarity(entry.vector().as_slice(), query),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    scored
}
