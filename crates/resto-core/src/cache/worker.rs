//! Offline cache worker: install, activate, and request interception.

use url::Url;

use super::fetcher::AssetFetcher;
use super::storage::{manifest_key, storage_key, AssetResponse, CacheStorage};
use crate::error::{Error, Result, TransportError};

pub const STATIC_CACHE: &str = "restaurants-v1";
pub const EXTERNAL_CACHE: &str = "restaurants-externals-v1";
pub const CACHE_PREFIX: &str = "restaurants-";
pub const MAP_TILES_ORIGIN: &str = "https://api.tiles.mapbox.com";

const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "index.html",
    "restaurant.html",
    "js/main.js",
    "js/restaurant_info.js",
    "js/leaflet.js",
    "css/styles.css",
    "css/leaflet.css",
    "img/1.jpg",
    "img/2.jpg",
    "img/3.jpg",
    "img/4.jpg",
    "img/5.jpg",
    "img/6.jpg",
    "img/7.jpg",
    "img/8.jpg",
    "img/9.jpg",
    "img/10.jpg",
    "img/marker-icon.png",
    "img/marker-icon-2x.png",
    "img/marker-shadow.png",
];

/// Cache generation names and what goes into them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub static_cache: String,
    pub external_cache: String,
    /// Caches carrying this prefix belong to the app and may be purged
    pub prefix: String,
    /// Same-origin assets precached on install
    pub manifest: Vec<String>,
    /// External origins whose responses are cached lazily
    pub external_origins: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            static_cache: STATIC_CACHE.to_string(),
            external_cache: EXTERNAL_CACHE.to_string(),
            prefix: CACHE_PREFIX.to_string(),
            manifest: DEFAULT_MANIFEST.iter().map(ToString::to_string).collect(),
            external_origins: vec![MAP_TILES_ORIGIN.to_string()],
        }
    }
}

impl CacheConfig {
    /// Whether `name` is one of the current generations.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_cache || name == self.external_cache
    }
}

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    StaticCache,
    ExternalCache,
    Network,
}

impl ServedFrom {
    pub const fn label(self) -> &'static str {
        match self {
            Self::StaticCache => "static-cache",
            Self::ExternalCache => "external-cache",
            Self::Network => "network",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intercepted {
    pub response: AssetResponse,
    pub served_from: ServedFrom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub cache: String,
    pub assets: usize,
}

pub struct CacheWorker<F> {
    storage: CacheStorage,
    fetcher: F,
    app_origin: Url,
    config: CacheConfig,
}

impl<F: AssetFetcher> CacheWorker<F> {
    pub fn new(
        storage: CacheStorage,
        fetcher: F,
        app_origin: &str,
        config: CacheConfig,
    ) -> Result<Self> {
        let app_origin = Url::parse(app_origin)
            .map_err(|error| Error::Config(format!("Invalid app origin '{app_origin}': {error}")))?;
        Ok(Self {
            storage,
            fetcher,
            app_origin,
            config,
        })
    }

    pub const fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Precache the manifest. Nothing is written unless every asset was
    /// fetched successfully.
    pub async fn install(&self) -> Result<InstallReport> {
        let mut entries = Vec::with_capacity(self.config.manifest.len());
        for entry in &self.config.manifest {
            let url = self.resolve(entry)?;
            let response = self.fetcher.fetch(&url).await?;
            if !response.is_success() {
                return Err(TransportError::Status {
                    status: response.status,
                    message: format!("precaching {url}"),
                }
                .into());
            }
            entries.push((manifest_key(entry), response));
        }

        let assets = entries.len();
        self.storage
            .replace(&self.config.static_cache, entries)
            .await?;
        tracing::info!(
            "Installed {assets} asset(s) into cache '{}'",
            self.config.static_cache
        );
        Ok(InstallReport {
            cache: self.config.static_cache.clone(),
            assets,
        })
    }

    /// Delete every app cache that is not a current generation; returns the
    /// deleted names.
    pub async fn activate(&self) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for name in self.storage.keys().await? {
            if name.starts_with(&self.config.prefix) && !self.config.is_current(&name) {
                self.storage.delete(&name).await?;
                tracing::info!("Deleted stale cache '{name}'");
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Answer a request the way the app's offline worker would.
    ///
    /// `request` may be absolute or relative to the app origin.
    pub async fn intercept(&self, request: &str) -> Result<Intercepted> {
        let url = self.resolve(request)?;

        if url.origin() == self.app_origin.origin() {
            if let Some(response) = self.cached(&self.config.static_cache, &url).await {
                return Ok(Intercepted {
                    response,
                    served_from: ServedFrom::StaticCache,
                });
            }
            return self.network(&url).await;
        }

        if self.is_external_asset(&url) {
            if let Some(response) = self.cached(&self.config.external_cache, &url).await {
                return Ok(Intercepted {
                    response,
                    served_from: ServedFrom::ExternalCache,
                });
            }
            let intercepted = self.network(&url).await?;
            if intercepted.response.is_success() {
                self.cache_external(&url, &intercepted.response).await;
            }
            return Ok(intercepted);
        }

        self.network(&url).await
    }

    /// A missing cache or an unreadable entry counts as a miss.
    async fn cached(&self, name: &str, url: &Url) -> Option<AssetResponse> {
        let key = storage_key(url);
        let found = match self.storage.lookup(name).await {
            Ok(Some(cache)) => cache.match_key(&key).await,
            Ok(None) => Ok(None),
            Err(error) => Err(error),
        };
        found.unwrap_or_else(|error| {
            tracing::warn!("Cache {name} unreadable for {key}, using network: {error}");
            None
        })
    }

    async fn cache_external(&self, url: &Url, response: &AssetResponse) {
        let key = storage_key(url);
        let stored = match self.storage.open(&self.config.external_cache).await {
            Ok(cache) => cache.put(&key, response).await,
            Err(error) => Err(error),
        };
        match stored {
            Ok(()) => tracing::debug!("Cached external asset {key}"),
            Err(error) => tracing::warn!("External asset {key} served but not cached: {error}"),
        }
    }

    fn is_external_asset(&self, url: &Url) -> bool {
        self.config.external_origins.iter().any(|origin| {
            Url::parse(origin).map_or(false, |origin| origin.origin() == url.origin())
        })
    }

    async fn network(&self, url: &Url) -> Result<Intercepted> {
        let response = self.fetcher.fetch(url).await?;
        Ok(Intercepted {
            response,
            served_from: ServedFrom::Network,
        })
    }

    fn resolve(&self, request: &str) -> Result<Url> {
        self.app_origin
            .join(request)
            .map_err(|error| Error::Config(format!("Invalid request URL '{request}': {error}")))
    }
}
