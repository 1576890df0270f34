//! Persisted artifacts shared by the model builder and the server.
//!
//! The item table and the similarity matrix are produced together and must
//! stay aligned row for row; [`load_catalog`] refuses a pair that is not.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::models::Item;

mod items;
mod matrix;

pub use items::{load_items, save_items};
pub use matrix::SimilarityMatrix;

/// Opens an artifact, mapping a missing file to `ArtifactMissing`
fn open_artifact(path: &Path) -> AppResult<File> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => AppError::ArtifactMissing(path.to_path_buf()),
        _ => AppError::Io(e),
    })
}

/// Loads the item table and similarity matrix and checks they line up
pub fn load_catalog(
    items_path: &Path,
    similarity_path: &Path,
) -> AppResult<(Vec<Item>, SimilarityMatrix)> {
    let items = load_items(items_path)?;
    let matrix = SimilarityMatrix::load(similarity_path)?;
    ensure_aligned(&items, &matrix)?;

    tracing::info!(
        items = items.len(),
        items_path = %items_path.display(),
        similarity_path = %similarity_path.display(),
        "Loaded catalog artifacts"
    );

    Ok((items, matrix))
}

/// Fails with `ArtifactCorrupt` unless there is one matrix row per item
pub fn ensure_aligned(items: &[Item], matrix: &SimilarityMatrix) -> AppResult<()> {
    if matrix.dimension() != items.len() {
        return Err(AppError::ArtifactCorrupt(format!(
            "Similarity matrix has {} rows but the item table has {} items",
            matrix.dimension(),
            items.len()
        )));
    }
    Ok(())
}
