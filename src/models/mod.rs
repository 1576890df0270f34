use serde::{Deserialize, Serialize};

mod item;
mod tmdb;

pub use item::{Item, ItemId, ItemTable};
pub use tmdb::{poster_url, MovieDetails, TmdbGenre, TmdbMovie};

/// One ranked recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub id: ItemId,
    /// Similarity as a percentage rounded to one decimal, for display only
    pub score_pct: f64,
    /// Unrounded similarity used for ranking
    #[serde(skip)]
    pub score: f32,
}

impl Recommendation {
    pub fn new(item: &Item, score: f32) -> Self {
        Self {
            title: item.title.clone(),
            id: item.id,
            score_pct: score_pct(score),
            score,
        }
    }
}

/// Rescales a similarity in [0, 1] to a percentage with one decimal
pub fn score_pct(score: f32) -> f64 {
    (f64::from(score) * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_pct_rounds_to_one_decimal() {
        assert_eq!(score_pct(0.12345), 12.3);
        assert_eq!(score_pct(0.12351), 12.4);
        assert_eq!(score_pct(1.0), 100.0);
        assert_eq!(score_pct(0.0), 0.0);
    }

    #[test]
    fn test_recommendation_serialization_hides_raw_score() {
        let item = Item::new(603, "The Matrix", "hacker");
        let rec = Recommendation::new(&item, 0.5);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["title"], "The Matrix");
        assert_eq!(json["id"], 603);
        assert_eq!(json["score_pct"], 50.0);
        assert!(json.get("score").is_none());
    }
}
