pub mod dataset_cache;
pub mod estimator;
pub mod loader;
