use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// External catalog identifier (TMDB movie id)
pub type ItemId = i64;

/// A recommendable movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// TMDB id, also used for poster lookups
    pub id: ItemId,
    /// Display title (not unique across the catalog)
    pub title: String,
    /// Genres, keywords, cast, crew and overview folded into one text blob
    pub tags: String,
}

impl Item {
    pub fn new(id: ItemId, title: impl Into<String>, tags: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            tags: tags.into(),
        }
    }
}

/// Columnar on-disk form of the catalog.
///
/// Row `i` of every column describes the item at matrix row `i`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemTable {
    #[serde(alias = "movie_id")]
    pub id: Vec<ItemId>,
    pub title: Vec<String>,
    pub tags: Vec<String>,
}

impl ItemTable {
    /// Converts the columns into rows, rejecting ragged tables
    pub fn into_items(self) -> AppResult<Vec<Item>> {
        let rows = self.id.len();
        if self.title.len() != rows || self.tags.len() != rows {
            return Err(AppError::ArtifactCorrupt(format!(
                "Item table columns have different lengths (id={}, title={}, tags={})",
                rows,
                self.title.len(),
                self.tags.len()
            )));
        }

        Ok(self
            .id
            .into_iter()
            .zip(self.title)
            .zip(self.tags)
            .map(|((id, title), tags)| Item { id, title, tags })
            .collect())
    }
}

impl From<&[Item]> for ItemTable {
    fn from(items: &[Item]) -> Self {
        Self {
            id: items.iter().map(|i| i.id).collect(),
            title: items.iter().map(|i| i.title.clone()).collect(),
            tags: items.iter().map(|i| i.tags.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_items_preserves_row_order() {
        let table = ItemTable {
            id: vec![19995, 285],
            title: vec!["Avatar".to_string(), "Pirates".to_string()],
            tags: vec!["action space".to_string(), "pirate sea".to_string()],
        };

        let items = table.into_items().unwrap();
        assert_eq!(items[0], Item::new(19995, "Avatar", "action space"));
        assert_eq!(items[1], Item::new(285, "Pirates", "pirate sea"));
    }

    #[test]
    fn test_into_items_rejects_ragged_columns() {
        let table = ItemTable {
            id: vec![1, 2],
            title: vec!["A".to_string()],
            tags: vec!["x".to_string(), "y".to_string()],
        };

        assert!(matches!(
            table.into_items(),
            Err(AppError::ArtifactCorrupt(_))
        ));
    }

    #[test]
    fn test_movie_id_column_alias() {
        let json = r#"{"movie_id": [603], "title": ["The Matrix"], "tags": ["hacker"]}"#;
        let table: ItemTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.id, vec![603]);
    }

    #[test]
    fn test_missing_column_fails_to_parse() {
        let json = r#"{"id": [603], "title": ["The Matrix"]}"#;
        assert!(serde_json::from_str::<ItemTable>(json).is_err());
    }
}
