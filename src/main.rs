use std::sync::Arc;

use anyhow::Context;

use cinematch::{
    api::{create_router, AppState},
    config::Config,
    services::{Engine, ResolutionCache, TmdbProvider},
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = Config::from_env()?;

    // The server cannot run without both artifacts
    let engine = Engine::load(&config.items_path, &config.similarity_path)
        .context("loading model artifacts")?;

    let provider = TmdbProvider::new(config.tmdb_api_url.clone(), config.lookup_timeout())?;
    if config.tmdb_api_key.is_none() {
        tracing::warn!("TMDB_API_KEY not configured, posters will not be resolved");
    }
    let resolver = ResolutionCache::new(
        Arc::new(provider),
        config.tmdb_api_key.clone(),
        config.tmdb_image_base_url.clone(),
        config.poster_cache_ttl(),
    );

    let state = AppState::new(Arc::new(engine), Arc::new(resolver))
        .with_limits(config.default_k, config.max_k);
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!(addr = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
