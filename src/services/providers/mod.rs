/// Movie metadata provider abstraction
///
/// The resolution cache talks to the upstream catalog only through this trait,
/// so the transport can be swapped (or mocked) without touching cache policy.
use crate::{
    error::AppResult,
    models::{ItemId, TmdbMovie},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for movie metadata lookups
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch one movie by its external id, authenticated with `api_key`
    async fn fetch_movie(&self, id: ItemId, api_key: &str) -> AppResult<TmdbMovie>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
