use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::RequestId;
use crate::models::{ItemId, MovieDetails, Recommendation};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: String,
    pub k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub query: String,
    pub recommendations: Vec<RecommendedMovie>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RecommendedMovie {
    pub title: String,
    pub id: ItemId,
    pub score_pct: f64,
    pub poster: Option<String>,
}

impl RecommendedMovie {
    fn new(recommendation: Recommendation, poster: Option<String>) -> Self {
        Self {
            title: recommendation.title,
            id: recommendation.id,
            score_pct: recommendation.score_pct,
            poster,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PosterResponse {
    pub id: ItemId,
    pub poster: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub movies: usize,
    pub posters_enabled: bool,
    pub cached_posters: usize,
    pub loaded_at: DateTime<Utc>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// All titles in catalog order
pub async fn get_titles(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.engine.titles().map(str::to_string).collect())
}

/// Catalog size and cache status
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        movies: state.engine.len(),
        posters_enabled: state.resolver.enabled(),
        cached_posters: state.resolver.cached_posters(),
        loaded_at: state.engine.loaded_at(),
    })
}

/// Movies similar to `title`, with posters where they resolve
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    if query.title.trim().is_empty() {
        return Err(AppError::InvalidInput("title must not be empty".to_string()));
    }

    let k = state.effective_k(query.k);
    let recommendations = state.engine.recommend(&query.title, k)?;

    let ids: Vec<ItemId> = recommendations.iter().map(|r| r.id).collect();
    let posters = state.resolver.resolve_many(&ids).await;

    tracing::info!(
        request_id = %request_id,
        title = %query.title,
        k,
        returned = recommendations.len(),
        posters = posters.iter().filter(|p| p.is_some()).count(),
        "Recommendations served"
    );

    Ok(Json(RecommendationResponse {
        query: query.title,
        recommendations: recommendations
            .into_iter()
            .zip(posters)
            .map(|(rec, poster)| RecommendedMovie::new(rec, poster))
            .collect(),
    }))
}

/// Poster URL for one movie; `null` when unavailable
pub async fn get_poster(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> AppResult<Json<PosterResponse>> {
    ensure_in_catalog(&state, id)?;
    let poster = state.resolver.resolve(id).await;
    Ok(Json(PosterResponse { id, poster }))
}

/// Movie details from the upstream catalog
pub async fn get_details(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> AppResult<Json<MovieDetails>> {
    ensure_in_catalog(&state, id)?;
    state
        .resolver
        .details(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No details available for movie {}", id)))
}

/// `NotFound` unless `id` is in the loaded catalog
fn ensure_in_catalog(state: &AppState, id: ItemId) -> AppResult<()> {
    if state.engine.contains_id(id) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Movie {} is not in the catalog", id)))
    }
}
