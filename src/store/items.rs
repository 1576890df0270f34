use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::models::{Item, ItemTable};

use super::open_artifact;

/// Reads the columnar JSON item table, preserving row order
pub fn load_items(path: &Path) -> AppResult<Vec<Item>> {
    let file = open_artifact(path)?;
    let table: ItemTable = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        AppError::ArtifactCorrupt(format!(
            "Failed to parse item table {}: {}",
            path.display(),
            e
        ))
    })?;
    table.into_items()
}

/// Writes `items` as a columnar JSON item table
pub fn save_items(path: &Path, items: &[Item]) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &ItemTable::from(items))
        .map_err(|e| AppError::Internal(format!("Failed to encode item table: {}", e)))?;
    writer.flush()?;
    Ok(())
}
