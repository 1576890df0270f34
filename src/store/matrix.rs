use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::open_artifact;

/// Dense, square, row-major similarity scores.
///
/// Row and column `i` refer to the item at position `i` of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    scores: Vec<f32>,
}

/// On-disk layout of the matrix
#[derive(Serialize, Deserialize)]
struct SimilarityArtifact {
    n_items: u64,
    scores: Vec<f32>,
}

impl SimilarityMatrix {
    /// Wraps row-major `scores`, which must hold exactly `n * n` values
    pub fn new(n: usize, scores: Vec<f32>) -> AppResult<Self> {
        let expected = n.checked_mul(n).ok_or_else(|| {
            AppError::ArtifactCorrupt(format!("Matrix dimension {} overflows", n))
        })?;
        if scores.len() != expected {
            return Err(AppError::ArtifactCorrupt(format!(
                "Matrix of dimension {} needs {} scores, found {}",
                n,
                expected,
                scores.len()
            )));
        }
        Ok(Self { n, scores })
    }

    /// Number of rows (and columns)
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// Similarities of item `i` to every item, itself included
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i >= self.n {
            return None;
        }
        Some(&self.scores[i * self.n..(i + 1) * self.n])
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        self.row(i).and_then(|row| row.get(j).copied())
    }

    /// The `k` rows most similar to row `i`, excluding `i` itself.
    ///
    /// Ordered by descending score; equal scores keep ascending row order.
    pub fn top_k(&self, i: usize, k: usize) -> Option<Vec<(usize, f32)>> {
        let row = self.row(i)?;
        let mut ranked: Vec<(usize, f32)> = row
            .iter()
            .copied()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .collect();

        // Stable sort, so ties stay in row order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        Some(ranked)
    }

    /// Smallest, largest and mean score across every cell
    pub fn summary(&self) -> (f32, f32, f64) {
        if self.scores.is_empty() {
            return (0.0, 0.0, 0.0);
        }
        let min = self.scores.iter().copied().fold(f32::INFINITY, f32::min);
        let max = self.scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mean =
            self.scores.iter().map(|&s| f64::from(s)).sum::<f64>() / self.scores.len() as f64;
        (min, max, mean)
    }

    /// Reads a bincode matrix artifact
    pub fn load(path: &Path) -> AppResult<Self> {
        let file = open_artifact(path)?;
        let artifact: SimilarityArtifact = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| {
                AppError::ArtifactCorrupt(format!(
                    "Failed to decode similarity matrix {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let n = usize::try_from(artifact.n_items).map_err(|_| {
            AppError::ArtifactCorrupt(format!("Matrix dimension {} too large", artifact.n_items))
        })?;
        if let Some(pos) = artifact
            .scores
            .iter()
            .position(|s| !s.is_finite() || !(0.0..=1.0).contains(s))
        {
            return Err(AppError::ArtifactCorrupt(format!(
                "Similarity matrix {} has invalid score {} at cell {}",
                path.display(),
                artifact.scores[pos],
                pos
            )));
        }
        Self::new(n, artifact.scores)
    }

    /// Writes the matrix as a bincode artifact, replacing any existing file
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let artifact = SimilarityArtifact {
            n_items: self.n as u64,
            scores: self.scores.clone(),
        };
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, &artifact)
            .map_err(|e| AppError::Internal(format!("Failed to encode similarity matrix: {}", e)))?;
        writer.flush()?;
        Ok(())
    }
}
