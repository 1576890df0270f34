use crate::error::AppResult;
use crate::store::SimilarityMatrix;

use super::tfidf::TfidfMatrix;

/// All-pairs cosine similarity of unit-length TF-IDF rows.
///
/// Rows are already normalized, so the cosine is the plain dot product. Dot
/// products are accumulated through a term → postings index, visiting only
/// documents that share a term. Shared terms are always summed in ascending
/// term order, which keeps the result exactly symmetric.
pub fn cosine_similarity(features: &TfidfMatrix) -> AppResult<SimilarityMatrix> {
    let n = features.n_rows();

    let mut postings: Vec<Vec<(usize, f64)>> = vec![Vec::new(); features.n_features()];
    for (doc, row) in features.rows.iter().enumerate() {
        for &(term, weight) in row {
            postings[term].push((doc, weight));
        }
    }

    let mut scores = vec![0f32; n * n];
    let mut acc = vec![0f64; n];
    for (i, row) in features.rows.iter().enumerate() {
        acc.fill(0.0);
        for &(term, weight) in row {
            for &(j, other) in &postings[term] {
                acc[j] += weight * other;
            }
        }

        let out = &mut scores[i * n..(i + 1) * n];
        for (cell, &dot) in out.iter_mut().zip(&acc) {
            *cell = dot.clamp(0.0, 1.0) as f32;
        }
    }

    SimilarityMatrix::new(n, scores)
}
