use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{Item, ItemId, Recommendation},
    store::{self, SimilarityMatrix},
};

/// Serves top-K similar items from a precomputed similarity matrix.
///
/// Holds the catalog and its matrix read-only for the life of the process;
/// every query takes `&self`, so one engine can be shared across requests.
#[derive(Debug)]
pub struct Engine {
    items: Vec<Item>,
    ids: HashSet<ItemId>,
    matrix: SimilarityMatrix,
    loaded_at: DateTime<Utc>,
}

impl Engine {
    /// Pairs a catalog with its matrix, which must have one row per item
    pub fn new(items: Vec<Item>, matrix: SimilarityMatrix) -> AppResult<Self> {
        store::ensure_aligned(&items, &matrix)?;
        let ids = items.iter().map(|item| item.id).collect();
        Ok(Self {
            items,
            ids,
            matrix,
            loaded_at: Utc::now(),
        })
    }

    /// Loads both artifacts from disk
    pub fn load(items_path: &Path, similarity_path: &Path) -> AppResult<Self> {
        let (items, matrix) = store::load_catalog(items_path, similarity_path)?;
        Self::new(items, matrix)
    }

    /// Row index of the first item titled exactly `title`
    pub fn index_of(&self, title: &str) -> Option<usize> {
        self.items.iter().position(|item| item.title == title)
    }

    /// Whether `id` belongs to the loaded catalog
    pub fn contains_id(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    /// The `k` items most similar to the one titled `title`.
    ///
    /// Duplicate titles resolve to the first in catalog order. The queried
    /// item is never part of its own result.
    pub fn recommend(&self, title: &str, k: usize) -> AppResult<Vec<Recommendation>> {
        let index = self
            .index_of(title)
            .ok_or_else(|| AppError::NotFound(format!("Movie not found: {}", title)))?;

        let ranked = self.matrix.top_k(index, k).ok_or_else(|| {
            AppError::Internal(format!("No similarity row for catalog index {}", index))
        })?;

        let recommendations: Vec<Recommendation> = ranked
            .into_iter()
            .map(|(j, score)| Recommendation::new(&self.items[j], score))
            .collect();

        tracing::debug!(
            title = %title,
            index,
            k,
            returned = recommendations.len(),
            "Recommendations ranked"
        );

        Ok(recommendations)
    }

    /// All titles in catalog order
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.title.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{SimilarityBuilder, TfidfParams};

    fn engine_from(items: Vec<Item>) -> Engine {
        let model = SimilarityBuilder::new(TfidfParams::default())
            .build(&items)
            .unwrap();
        Engine::new(items, model.matrix).unwrap()
    }

    fn sample_engine() -> Engine {
        engine_from(vec![
            Item::new(1, "A", "space opera"),
            Item::new(2, "B", "space opera"),
            Item::new(3, "C", "romance drama"),
        ])
    }

    fn fixed_engine() -> Engine {
        let items = vec![
            Item::new(10, "Alien", ""),
            Item::new(11, "Aliens", ""),
            Item::new(12, "Heat", ""),
            Item::new(13, "Ronin", ""),
            Item::new(14, "Alien", ""),
        ];
        #[rustfmt::skip]
        let matrix = SimilarityMatrix::new(5, vec![
            1.0, 0.8, 0.3, 0.3, 0.9,
            0.8, 1.0, 0.1, 0.1, 0.7,
            0.3, 0.1, 1.0, 0.6, 0.2,
            0.3, 0.1, 0.6, 1.0, 0.2,
            0.9, 0.7, 0.2, 0.2, 1.0,
        ])
        .unwrap();
        Engine::new(items, matrix).unwrap()
    }

    #[test]
    fn test_shared_vocabulary_ranks_first() {
        let engine = sample_engine();
        let recs = engine.recommend("A", 2).unwrap();

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title, "B");
        assert_eq!(recs[1].title, "C");
        assert!(recs[0].score > recs[1].score);
        assert_eq!(recs[0].score_pct, 100.0);
    }

    #[test]
    fn test_contains_id() {
        let engine = fixed_engine();
        assert!(engine.contains_id(12));
        assert!(!engine.contains_id(99));
    }

    #[test]
    fn test_unknown_title_is_not_found() {
        let engine = sample_engine();
        assert!(matches!(
            engine.recommend("Z", 5),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_query_item_is_excluded() {
        let engine = fixed_engine();
        for title in ["Aliens", "Heat", "Ronin"] {
            let recs = engine.recommend(title, 10).unwrap();
            assert!(recs.iter().all(|r| r.title != title));
        }
    }

    #[test]
    fn test_result_length_is_min_of_k_and_others() {
        let engine = fixed_engine();
        assert_eq!(engine.recommend("Heat", 2).unwrap().len(), 2);
        assert_eq!(engine.recommend("Heat", 4).unwrap().len(), 4);
        assert_eq!(engine.recommend("Heat", 50).unwrap().len(), 4);
        assert!(engine.recommend("Heat", 0).unwrap().is_empty());
    }

    #[test]
    fn test_ties_break_by_catalog_order() {
        let engine = fixed_engine();
        let ids: Vec<i64> = engine
            .recommend("Heat", 4)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![13, 10, 14, 11]);

        // Heat and Ronin both score 0.1 against Aliens
        let ids: Vec<i64> = engine
            .recommend("Aliens", 4)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![10, 14, 12, 13]);

        let ids: Vec<i64> = engine
            .recommend("Ronin", 2)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![12, 10]);
    }

    #[test]
    fn test_duplicate_title_resolves_to_first_row() {
        let engine = fixed_engine();
        assert_eq!(engine.index_of("Alien"), Some(0));

        let recs = engine.recommend("Alien", 4).unwrap();
        // Row 0 is the query; the later "Alien" (id 14) is a regular result
        assert_eq!(recs[0].id, 14);
        assert!(recs.iter().all(|r| r.id != 10));
    }

    #[test]
    fn test_results_are_sorted_and_repeatable() {
        let engine = engine_from(vec![
            Item::new(1, "Avatar", "space marine alien planet war"),
            Item::new(2, "Aliens", "space marine alien war"),
            Item::new(3, "Titanic", "ship romance iceberg"),
            Item::new(4, "The Notebook", "romance drama letters ship"),
            Item::new(5, "Gravity", "space station drama"),
            Item::new(6, "Sunshine", "space station sun"),
        ]);

        let first = engine.recommend("Avatar", 5).unwrap();
        for pair in first.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(engine.recommend("Avatar", 5).unwrap(), first);
    }

    #[test]
    fn test_misaligned_matrix_is_rejected() {
        let items = vec![Item::new(1, "A", "x")];
        let matrix = SimilarityMatrix::new(2, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        assert!(matches!(
            Engine::new(items, matrix),
            Err(AppError::ArtifactCorrupt(_))
        ));
    }

    #[test]
    fn test_titles_in_catalog_order() {
        let engine = sample_engine();
        assert_eq!(engine.titles().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(engine.len(), 3);
        assert!(!engine.is_empty());
    }
}
