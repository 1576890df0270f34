//! Offline similarity model builder.
//!
//! Turns the catalog's tag blobs into TF-IDF vectors and a dense cosine
//! similarity matrix. The output is a pure function of the items and
//! [`TfidfParams`].

use std::path::{Path, PathBuf};

use tracing::instrument;

use crate::config::BuilderConfig;
use crate::error::{AppError, AppResult};
use crate::models::Item;
use crate::store::SimilarityMatrix;

pub mod similarity;
pub mod tfidf;
pub mod tokenize;

pub use tfidf::{TfidfMatrix, TfidfParams, TfidfVectorizer};

/// Output of one build
#[derive(Debug, Clone)]
pub struct SimilarityModel {
    pub features: TfidfMatrix,
    pub matrix: SimilarityMatrix,
}

/// Builds similarity models with fixed vectorizer settings
#[derive(Debug, Clone)]
pub struct SimilarityBuilder {
    params: TfidfParams,
}

impl From<&BuilderConfig> for TfidfParams {
    fn from(config: &BuilderConfig) -> Self {
        Self {
            max_features: config.max_features,
            min_df: config.min_df,
            max_df: config.max_df,
            ngram_range: (config.ngram_min, config.ngram_max),
        }
    }
}

impl SimilarityBuilder {
    pub fn new(params: TfidfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TfidfParams {
        &self.params
    }

    /// Vectorizes `items` and computes their all-pairs similarity
    #[instrument(skip_all, fields(items = items.len()))]
    pub fn build(&self, items: &[Item]) -> AppResult<SimilarityModel> {
        if items.is_empty() {
            return Err(AppError::EmptyCatalog);
        }

        tracing::info!(
            max_features = self.params.max_features,
            min_df = self.params.min_df,
            max_df = self.params.max_df,
            ngram_range = ?self.params.ngram_range,
            "Fitting TF-IDF vectorizer"
        );

        let tags: Vec<&str> = items.iter().map(|item| item.tags.as_str()).collect();
        let features = TfidfVectorizer::new(self.params.clone()).fit_transform(&tags)?;

        tracing::info!(
            rows = features.n_rows(),
            vocabulary = features.n_features(),
            sparsity_pct = %format!("{:.1}", features.sparsity_pct()),
            "Feature matrix built"
        );
        for (term, idf) in features.top_idf_terms(10) {
            tracing::info!(term, idf = %format!("{:.2}", idf), "Discriminative term");
        }

        let matrix = similarity::cosine_similarity(&features)?;
        let (min, max, mean) = matrix.summary();
        tracing::info!(
            dimension = matrix.dimension(),
            min = %format!("{:.4}", min),
            max = %format!("{:.4}", max),
            mean = %format!("{:.4}", mean),
            "Similarity matrix computed"
        );

        Ok(SimilarityModel { features, matrix })
    }
}

/// One probe title ranked by a previous model and by the new one
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeComparison {
    pub probe: String,
    /// `(title, score)` per rank; `None` when the probe is not in the catalog
    pub ranks: Option<Vec<((String, f32), (String, f32))>>,
}

/// Ranks each probe title under both models, top 5 side by side.
///
/// Probes are matched case-insensitively, first match wins.
pub fn compare_models(
    items: &[Item],
    old: &SimilarityMatrix,
    new: &SimilarityMatrix,
    probes: &[String],
) -> Vec<ProbeComparison> {
    probes
        .iter()
        .map(|probe| {
            let needle = probe.to_lowercase();
            let ranks = items
                .iter()
                .position(|item| item.title.to_lowercase() == needle)
                .and_then(|index| Some((old.top_k(index, 5)?, new.top_k(index, 5)?)))
                .map(|(old_top, new_top)| {
                    let named = |(j, score): (usize, f32)| (items[j].title.clone(), score);
                    old_top
                        .into_iter()
                        .map(named)
                        .zip(new_top.into_iter().map(named))
                        .collect()
                });

            ProbeComparison {
                probe: probe.clone(),
                ranks,
            }
        })
        .collect()
}

/// Logs a model comparison, one line per rank
pub fn log_comparison(comparisons: &[ProbeComparison]) {
    for comparison in comparisons {
        match &comparison.ranks {
            None => tracing::warn!(probe = %comparison.probe, "Probe title not in catalog"),
            Some(ranks) => {
                for (rank, ((old_title, old_score), (new_title, new_score))) in
                    ranks.iter().enumerate()
                {
                    tracing::info!(
                        probe = %comparison.probe,
                        rank = rank + 1,
                        old = %old_title,
                        old_pct = %format!("{:.1}", old_score * 100.0),
                        new = %new_title,
                        new_pct = %format!("{:.1}", new_score * 100.0),
                        "Model comparison"
                    );
                }
            }
        }
    }
}

/// `models/similarity.bin` → `models/similarity_original.bin`
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_original.{}", stem, ext.to_string_lossy()),
        None => format!("{}_original", stem),
    };
    path.with_file_name(name)
}

/// Copies an existing artifact to its backup path, once.
///
/// Returns the backup path when a copy was made.
pub fn backup_existing(path: &Path) -> AppResult<Option<PathBuf>> {
    let backup = backup_path(path);
    if !path.exists() || backup.exists() {
        return Ok(None);
    }
    std::fs::copy(path, &backup)?;
    tracing::info!(backup = %backup.display(), "Backed up previous similarity matrix");
    Ok(Some(backup))
}
