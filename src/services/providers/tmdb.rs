/// TMDB API provider
///
/// Single endpoint: `GET /movie/{id}` returns the movie payload, including the
/// poster path used to build display URLs.
use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::{ItemId, TmdbMovie},
    services::providers::MetadataProvider,
};

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_url: String,
}

impl TmdbProvider {
    /// Creates a provider whose requests give up after `timeout`
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_url: api_url.into(),
        })
    }

    fn movie_url(&self, id: ItemId) -> String {
        format!("{}/movie/{}", self.api_url.trim_end_matches('/'), id)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn fetch_movie(&self, id: ItemId, api_key: &str) -> AppResult<TmdbMovie> {
        let response = self
            .http_client
            .get(self.movie_url(id))
            .query(&[("api_key", api_key), ("language", "en-US")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamUnavailable(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        let movie: TmdbMovie = serde_json::from_str(&response_text).map_err(|e| {
            tracing::debug!(response = %response_text, "Raw TMDB response");
            AppError::UpstreamUnavailable(format!("Failed to parse TMDB response: {}", e))
        })?;

        tracing::debug!(
            movie_id = id,
            has_poster = movie.poster_path().is_some(),
            provider = "tmdb",
            "Movie fetched"
        );

        Ok(movie)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
