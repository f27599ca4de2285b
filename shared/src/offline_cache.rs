//! Offline asset cache.
//!
//! Platform-neutral version of the service-worker policy: prime a versioned
//! cache with the app shell at install time, drop every other version at
//! activation, and answer each request from the cache before falling back to
//! the network. There is no revalidation; a new version tag is the only way
//! to refresh cached assets.

use std::num::NonZeroUsize;

use lru::LruCache;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::capabilities::{HttpError, HttpResponse, HttpResult, ResourceUrl};

pub const DEFAULT_CACHE_VERSION: &str = "SearchSites-v1";
pub const MAX_ENTRIES_PER_CACHE: usize = 512;

const DEFAULT_ASSETS: &[&str] = &[
    "/SearchSites/",
    "/SearchSites/index.html",
    "/SearchSites/styles.css",
    "/SearchSites/script_page_load.js",
    "/SearchSites/login.html",
    "/SearchSites/login.js",
    "/SearchSites/login.css",
    "/SearchSites/images/icon192.png",
    "/SearchSites/images/icon512.png",
    "/SearchSites/script.js",
    "/SearchSites/manifest.json",
    "/SearchSites/Sites.json",
    "https://stackpath.bootstrapcdn.com/bootstrap/4.5.2/css/bootstrap.min.css",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheManifest {
    pub version_tag: String,
    pub assets: Vec<String>,
}

impl Default for CacheManifest {
    fn default() -> Self {
        Self {
            version_tag: DEFAULT_CACHE_VERSION.to_string(),
            assets: DEFAULT_ASSETS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid asset URL: {0}")]
    InvalidUrl(#[from] HttpError),

    #[error("fetching {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: HttpError,
    },

    #[error("fetching {url} returned HTTP status {status}")]
    BadStatus { url: String, status: u16 },
}

/// Named caches of responses keyed by request URL.
pub trait CacheStorage {
    fn open(&mut self, name: &str);

    fn put(&mut self, name: &str, url: &str, response: HttpResponse);

    /// Search every cache, oldest first.
    fn lookup(&mut self, url: &str) -> Option<HttpResponse>;

    fn names(&self) -> Vec<String>;

    fn delete(&mut self, name: &str) -> bool;
}

/// Network access for cache misses and installation.
pub trait Fetch {
    fn fetch(&mut self, url: &ResourceUrl) -> HttpResult;
}

impl<F> Fetch for F
where
    F: FnMut(&ResourceUrl) -> HttpResult,
{
    fn fetch(&mut self, url: &ResourceUrl) -> HttpResult {
        self(url)
    }
}

pub struct MemoryCacheStorage {
    caches: Vec<(String, LruCache<String, HttpResponse>)>,
    capacity: NonZeroUsize,
}

impl MemoryCacheStorage {
    pub fn new(capacity: usize) -> Self {
        Self {
            caches: Vec::new(),
            capacity: NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
        }
    }

    pub fn entry_count(&self, name: &str) -> usize {
        self.caches
            .iter()
            .find(|(n, _)| n == name)
            .map_or(0, |(_, cache)| cache.len())
    }
}

impl Default for MemoryCacheStorage {
    fn default() -> Self {
        Self::new(MAX_ENTRIES_PER_CACHE)
    }
}

impl std::fmt::Debug for MemoryCacheStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheStorage")
            .field("caches", &self.names())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl CacheStorage for MemoryCacheStorage {
    fn open(&mut self, name: &str) {
        if !self.caches.iter().any(|(n, _)| n == name) {
            self.caches
                .push((name.to_string(), LruCache::new(self.capacity)));
        }
    }

    fn put(&mut self, name: &str, url: &str, response: HttpResponse) {
        self.open(name);
        if let Some((_, cache)) = self.caches.iter_mut().find(|(n, _)| n == name) {
            if let Some((evicted, _)) = cache.push(url.to_string(), response) {
                if evicted != url {
                    debug!(cache = name, url = %evicted, "evicted cached response");
                }
            }
        }
    }

    fn lookup(&mut self, url: &str) -> Option<HttpResponse> {
        let key = url.to_string();
        self.caches
            .iter_mut()
            .find_map(|(_, cache)| cache.get(&key).cloned())
    }

    fn names(&self) -> Vec<String> {
        self.caches.iter().map(|(n, _)| n.clone()).collect()
    }

    fn delete(&mut self, name: &str) -> bool {
        let before = self.caches.len();
        self.caches.retain(|(n, _)| n != name);
        self.caches.len() != before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: HttpResponse,
    pub source: ResponseSource,
}

#[derive(Debug)]
pub struct OfflineCache<S> {
    manifest: CacheManifest,
    storage: S,
}

impl<S: CacheStorage> OfflineCache<S> {
    pub fn new(manifest: CacheManifest, storage: S) -> Self {
        Self { manifest, storage }
    }

    pub fn manifest(&self) -> &CacheManifest {
        &self.manifest
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Fetch every manifest asset into the current version's cache. Nothing is
    /// stored unless every asset fetches with a success status.
    #[instrument(skip_all, fields(version = %self.manifest.version_tag))]
    pub fn install<F: Fetch>(&mut self, fetcher: &mut F) -> Result<usize, CacheError> {
        let urls = self
            .manifest
            .assets
            .iter()
            .map(|asset| ResourceUrl::new(asset.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut fetched = Vec::with_capacity(urls.len());
        for url in urls {
            let response = fetcher.fetch(&url).map_err(|source| CacheError::Fetch {
                url: url.as_str().to_string(),
                source,
            })?;
            if !response.is_success() {
                warn!(url = url.as_str(), status = response.status, "asset fetch failed, install aborted");
                return Err(CacheError::BadStatus {
                    url: url.as_str().to_string(),
                    status: response.status,
                });
            }
            fetched.push((url, response));
        }

        let tag = self.manifest.version_tag.as_str();
        self.storage.open(tag);
        let count = fetched.len();
        for (url, response) in fetched {
            self.storage.put(tag, url.as_str(), response);
        }

        info!(count, "offline cache primed");
        Ok(count)
    }

    /// Delete every cache that does not belong to the current version.
    /// Returns the deleted cache names.
    #[instrument(skip_all, fields(version = %self.manifest.version_tag))]
    pub fn activate(&mut self) -> Vec<String> {
        let stale: Vec<String> = self
            .storage
            .names()
            .into_iter()
            .filter(|name| *name != self.manifest.version_tag)
            .collect();

        for name in &stale {
            if self.storage.delete(name) {
                info!(cache = %name, "deleted stale cache");
            }
        }
        stale
    }

    /// Cached response when present, otherwise whatever the network returns.
    /// Network responses are not written back.
    pub fn respond<F: Fetch>(&mut self, url: &str, fetcher: &mut F) -> Result<Served, CacheError> {
        let url = ResourceUrl::new(url)?;

        if let Some(response) = self.storage.lookup(url.as_str()) {
            debug!(url = url.as_str(), "served from cache");
            return Ok(Served {
                response,
                source: ResponseSource::Cache,
            });
        }

        let response = fetcher.fetch(&url).map_err(|source| CacheError::Fetch {
            url: url.as_str().to_string(),
            source,
        })?;
        debug!(url = url.as_str(), status = response.status, "served from network");
        Ok(Served {
            response,
            source: ResponseSource::Network,
        })
    }
}
