use std::sync::Arc;

use crate::services::{Engine, ResolutionCache};

/// Shared application state
///
/// The engine is immutable after load; the resolution cache handles its own
/// synchronization, so no lock wraps either.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub resolver: Arc<ResolutionCache>,
    pub default_k: usize,
    pub max_k: usize,
}

impl AppState {
    pub fn new(engine: Arc<Engine>, resolver: Arc<ResolutionCache>) -> Self {
        Self {
            engine,
            resolver,
            default_k: 5,
            max_k: 50,
        }
    }

    /// Overrides the default and maximum `k`
    pub fn with_limits(mut self, default_k: usize, max_k: usize) -> Self {
        self.max_k = max_k;
        self.default_k = default_k.min(max_k);
        self
    }

    /// Requested `k`, defaulted and capped
    pub fn effective_k(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_k).min(self.max_k)
    }
}
