use axum::extract::FromRef;

use crate::config::Config;
use crate::services::dataset_cache::DatasetCache;

/// Everything the handlers share: the immutable configuration and the
/// content-addressed dataset cache. Handlers extract either part via
/// `FromRef`, so a single `.with_state(shared)` covers both.
#[derive(Clone)]
pub struct SharedState {
    pub config: Config,
    pub cache: DatasetCache,
}

impl SharedState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cache: DatasetCache::new(),
        }
    }
}

impl FromRef<SharedState> for Config {
    fn from_ref(shared: &SharedState) -> Self {
        shared.config.clone()
    }
}

impl FromRef<SharedState> for DatasetCache {
    fn from_ref(shared: &SharedState) -> Self {
        shared.cache.clone()
    }
}
