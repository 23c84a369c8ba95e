//! Offline asset caching.
//!
//! Precaches the app shell, purges stale cache generations, and answers
//! asset requests cache-first so the UI keeps loading without a network.

mod fetcher;
mod storage;
mod worker;

pub use fetcher::{AssetFetcher, HttpAssetFetcher};
pub use storage::{manifest_key, storage_key, AssetResponse, Cache, CacheStorage};
pub use worker::{
    CacheConfig, CacheWorker, InstallReport, Intercepted, ServedFrom, CACHE_PREFIX,
    EXTERNAL_CACHE, MAP_TILES_ORIGIN, STATIC_CACHE,
};
