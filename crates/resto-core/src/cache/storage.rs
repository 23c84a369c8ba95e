//! Named, versioned response caches on disk.
//!
//! Each cache is a directory under the root. An entry is a body file plus a
//! JSON metadata file, both named after the percent-encoded storage key.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Timestamp;

const BODY_EXT: &str = "body";
const META_EXT: &str = "json";
const STAGING_PREFIX: &str = ".staging-";

/// An HTTP response as stored in, or served from, a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl AssetResponse {
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    status: u16,
    content_type: Option<String>,
    stored_at: Timestamp,
}

/// Storage key for a URL: its path without the leading slash, query ignored.
pub fn storage_key(url: &Url) -> String {
    url.path().trim_start_matches('/').to_string()
}

/// Storage key for a manifest entry such as `/`, `index.html` or `./img/1.jpg`.
pub fn manifest_key(entry: &str) -> String {
    let entry = entry.split(['?', '#']).next().unwrap_or_default();
    entry
        .trim_start_matches("./")
        .trim_start_matches('/')
        .to_string()
}

/// Longest encoded key kept verbatim as a file name.
const MAX_STEM_LEN: usize = 120;

/// File name for a key. Long keys keep a readable prefix and end in a digest
/// of the whole key, so deep tile paths stay under the file name limit.
fn file_stem(key: &str) -> String {
    let encoded = urlencoding::encode(&format!("/{key}")).into_owned();
    if encoded.len() <= MAX_STEM_LEN {
        return encoded;
    }
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes()).simple();
    format!("{}~{digest}", &encoded[..MAX_STEM_LEN - 33])
}

/// All caches under one root directory.
#[derive(Debug, Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of every cache, sorted.
    pub async fn keys(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(error) => return Err(error.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub async fn has(&self, name: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.root.join(name)).await?)
    }

    /// Open a cache, creating it when missing.
    pub async fn open(&self, name: &str) -> Result<Cache> {
        let dir = self.root.join(name);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Cache {
            name: name.to_string(),
            dir,
        })
    }

    /// Open a cache only if it already exists.
    pub async fn lookup(&self, name: &str) -> Result<Option<Cache>> {
        let dir = self.root.join(name);
        if !tokio::fs::try_exists(&dir).await? {
            return Ok(None);
        }
        Ok(Some(Cache {
            name: name.to_string(),
            dir,
        }))
    }

    /// Delete a cache; returns whether it existed.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        match tokio::fs::remove_dir_all(self.root.join(name)).await {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    /// Look a key up across every cache, in name order.
    pub async fn match_key(&self, key: &str) -> Result<Option<AssetResponse>> {
        for name in self.keys().await? {
            let Some(cache) = self.lookup(&name).await? else {
                continue;
            };
            if let Some(response) = cache.match_key(key).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    /// Replace a cache with exactly `entries`.
    ///
    /// Entries are written to a staging directory first, so a failed write
    /// leaves any previous generation of the cache untouched.
    pub async fn replace(&self, name: &str, entries: Vec<(String, AssetResponse)>) -> Result<Cache> {
        let staging_name = format!("{STAGING_PREFIX}{name}");
        self.delete(&staging_name).await?;
        let staging = self.open(&staging_name).await?;
        for (key, response) in &entries {
            if let Err(error) = staging.put(key, response).await {
                self.delete(&staging_name).await?;
                return Err(error);
            }
        }

        self.delete(name).await?;
        let dir = self.root.join(name);
        tokio::fs::rename(&staging.dir, &dir).await?;
        Ok(Cache {
            name: name.to_string(),
            dir,
        })
    }
}

/// One named cache.
#[derive(Debug, Clone)]
pub struct Cache {
    name: String,
    dir: PathBuf,
}

impl Cache {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn paths(&self, key: &str) -> (PathBuf, PathBuf) {
        let stem = file_stem(key);
        (
            self.dir.join(format!("{stem}.{BODY_EXT}")),
            self.dir.join(format!("{stem}.{META_EXT}")),
        )
    }

    pub async fn match_key(&self, key: &str) -> Result<Option<AssetResponse>> {
        let (body_path, meta_path) = self.paths(key);
        let raw_meta = match tokio::fs::read(&meta_path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        let meta: EntryMeta = serde_json::from_slice(&raw_meta)?;
        if meta.key != key {
            return Ok(None);
        }
        let body = match tokio::fs::read(&body_path).await {
            Ok(body) => body,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Cache '{}' has metadata but no body for {key}", self.name);
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };
        Ok(Some(AssetResponse {
            status: meta.status,
            content_type: meta.content_type,
            body,
        }))
    }

    /// Store a response; the metadata file is written last so a torn write
    /// reads as a miss.
    pub async fn put(&self, key: &str, response: &AssetResponse) -> Result<()> {
        let (body_path, meta_path) = self.paths(key);
        let meta = EntryMeta {
            key: key.to_string(),
            status: response.status,
            content_type: response.content_type.clone(),
            stored_at: Timestamp::now(),
        };
        tokio::fs::write(&body_path, &response.body).await?;
        tokio::fs::write(&meta_path, serde_json::to_vec(&meta)?).await?;
        Ok(())
    }

    /// Stored keys, sorted.
    pub async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(META_EXT) {
                continue;
            }
            let raw = tokio::fs::read(&path).await?;
            let meta: EntryMeta = serde_json::from_slice(&raw)?;
            keys.push(meta.key);
        }
        keys.sort();
        Ok(keys)
    }
}
