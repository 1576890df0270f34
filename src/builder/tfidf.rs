//! TF-IDF feature extraction over item tag blobs.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{AppError, AppResult};

use super::tokenize::Tokenizer;

/// Vectorizer settings
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfParams {
    /// Vocabulary cap, by total corpus count
    pub max_features: usize,
    /// Minimum number of documents a term must appear in
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in
    pub max_df: f64,
    /// Inclusive n-gram range
    pub ngram_range: (usize, usize),
}

impl Default for TfidfParams {
    fn default() -> Self {
        Self {
            max_features: 5000,
            min_df: 2,
            max_df: 0.8,
            ngram_range: (1, 2),
        }
    }
}

/// Sparse row: `(term index, weight)` sorted by term index
pub type SparseVector = Vec<(usize, f64)>;

/// Fitted vocabulary plus one unit-length vector per document
#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    /// Terms in index order (lexically sorted)
    pub vocabulary: Vec<String>,
    /// Smoothed inverse document frequency per term
    pub idf: Vec<f64>,
    pub rows: Vec<SparseVector>,
}

impl TfidfMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    /// Count of stored (non-zero) weights
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Percentage of zero cells in the dense view
    pub fn sparsity_pct(&self) -> f64 {
        let cells = self.n_rows() * self.n_features();
        if cells == 0 {
            return 100.0;
        }
        (1.0 - self.nnz() as f64 / cells as f64) * 100.0
    }

    /// The `n` terms with the highest IDF, most discriminative first
    pub fn top_idf_terms(&self, n: usize) -> Vec<(&str, f64)> {
        let mut terms: Vec<(&str, f64)> = self
            .vocabulary
            .iter()
            .map(String::as_str)
            .zip(self.idf.iter().copied())
            .collect();
        terms.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(n);
        terms
    }
}

/// Sublinear TF-IDF vectorizer with document-frequency filtering
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    params: TfidfParams,
    tokenizer: Tokenizer,
}

impl TfidfVectorizer {
    pub fn new(params: TfidfParams) -> Self {
        let tokenizer = Tokenizer::english(params.ngram_range.0, params.ngram_range.1);
        Self { params, tokenizer }
    }

    /// Learns the vocabulary from `documents` and weights every document.
    ///
    /// Documents without any surviving term get an empty (all-zero) row.
    pub fn fit_transform<S: AsRef<str>>(&self, documents: &[S]) -> AppResult<TfidfMatrix> {
        if documents.is_empty() {
            return Err(AppError::EmptyCatalog);
        }

        let n_docs = documents.len();
        let doc_counts: Vec<HashMap<String, usize>> = documents
            .iter()
            .map(|doc| {
                let mut counts = HashMap::new();
                for term in self.tokenizer.terms(doc.as_ref()) {
                    *counts.entry(term).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let mut corpus_count: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for counts in &doc_counts {
            for (term, &count) in counts {
                *corpus_count.entry(term.as_str()).or_insert(0) += count;
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let max_doc_count = self.params.max_df * n_docs as f64;
        let mut kept: Vec<(&str, usize)> = corpus_count
            .into_iter()
            .filter(|(term, _)| {
                let df = doc_freq[term];
                df >= self.params.min_df && df as f64 <= max_doc_count
            })
            .collect();

        if kept.is_empty() {
            return Err(AppError::EmptyVocabulary {
                min_df: self.params.min_df,
                max_df: self.params.max_df,
            });
        }

        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        kept.truncate(self.params.max_features);

        let vocabulary: Vec<String> = kept
            .into_iter()
            .map(|(term, _)| term.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.as_str(), i))
            .collect();

        let n = n_docs as f64;
        let idf: Vec<f64> = vocabulary
            .iter()
            .map(|term| {
                let df = doc_freq[term.as_str()] as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let rows = doc_counts
            .iter()
            .map(|counts| weigh(counts, &index, &idf))
            .collect();

        Ok(TfidfMatrix {
            vocabulary,
            idf,
            rows,
        })
    }
}

/// `(1 + ln tf) * idf`, L2-normalized
fn weigh(
    counts: &HashMap<String, usize>,
    index: &HashMap<&str, usize>,
    idf: &[f64],
) -> SparseVector {
    let weights: BTreeMap<usize, f64> = counts
        .iter()
        .filter_map(|(term, &count)| {
            index
                .get(term.as_str())
                .map(|&i| (i, (1.0 + (count as f64).ln()) * idf[i]))
        })
        .collect();

    let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm == 0.0 {
        return Vec::new();
    }
    weights.into_iter().map(|(i, w)| (i, w / norm)).collect()
}
