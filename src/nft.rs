//! NFT metadata retrieval.
//!
//! Metadata documents live behind token URIs, usually on IPFS. Fetches go
//! through an HTTP gateway and sit behind an explicit, size-bounded cache
//! that the caller constructs and owns; there is no module-global state.

use crate::error::AppError;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

pub const IPFS_GATEWAY: &str = "https://ipfs.loopring1.io/ipfs/";
pub const FALLBACK_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";

/// NFT metadata document as published at the token URI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NftMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub animation_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NftMetadata {
    /// Placeholder rendered when the metadata document cannot be retrieved.
    pub fn unavailable() -> Self {
        NftMetadata {
            name: Some("Couldn't fetch NFT details".to_string()),
            image: Some("/error".to_string()),
            animation_url: Some("/error".to_string()),
            description: None,
        }
    }
}

/// Size-bounded cache with insertion-order eviction.
///
/// Once full, inserting a new key drops the oldest key. Re-inserting an
/// existing key refreshes its value without changing its age.
#[derive(Debug)]
pub struct BoundedCache<V> {
    capacity: usize,
    inner: Mutex<CacheInner<V>>,
}

#[derive(Debug)]
struct CacheInner<V> {
    map: HashMap<String, V>,
    order: VecDeque<String>,
}

impl<V: Clone> BoundedCache<V> {
    pub fn new(capacity: usize) -> Self {
        BoundedCache {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.map.get(key).cloned()
    }

    pub fn insert(&self, key: String, value: V) {
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if inner.map.insert(key.clone(), value).is_none() {
            inner.order.push_back(key);
            if inner.order.len() > self.capacity {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.map.remove(&oldest);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fetches NFT metadata documents, caching by NFT id.
#[derive(Debug)]
pub struct NftMetadataClient {
    http: reqwest::Client,
    cache: BoundedCache<NftMetadata>,
}

impl NftMetadataClient {
    pub fn new(cache_capacity: usize) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(NftMetadataClient {
            http,
            cache: BoundedCache::new(cache_capacity),
        })
    }

    /// Rewrite an `ipfs://` URI to an HTTP gateway URL.
    pub fn gateway_url(uri: &str, gateway: &str) -> String {
        match uri.strip_prefix("ipfs://") {
            Some(path) => format!("{}{}", gateway, path),
            None => uri.to_string(),
        }
    }

    /// Fetch the metadata document for an NFT, consulting the cache first.
    ///
    /// The primary gateway is tried with the URI as-is; on failure, one
    /// retry goes to the fallback gateway with `/metadata.json` appended
    /// (collection URIs point at a directory). Anything still failing
    /// degrades to the placeholder, which is not cached so a later call
    /// can succeed.
    pub async fn metadata(&self, nft_id: &str, uri: &str) -> NftMetadata {
        if let Some(hit) = self.cache.get(nft_id) {
            return hit;
        }

        match self.fetch(&Self::gateway_url(uri, IPFS_GATEWAY)).await {
            Ok(metadata) => {
                self.cache.insert(nft_id.to_string(), metadata.clone());
                return metadata;
            }
            Err(e) => {
                warn!(nft_id = %nft_id, error = %e, "Primary metadata fetch failed, retrying");
            }
        }

        let retry_uri =
            Self::gateway_url(&format!("{}/metadata.json", uri), FALLBACK_IPFS_GATEWAY);
        match self.fetch(&retry_uri).await {
            Ok(metadata) => {
                self.cache.insert(nft_id.to_string(), metadata.clone());
                metadata
            }
            Err(e) => {
                warn!(nft_id = %nft_id, error = %e, "Metadata unavailable, using placeholder");
                NftMetadata::unavailable()
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<NftMetadata, AppError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Api(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Api(format!("GET {} returned {}", url, status)));
        }

        response
            .json::<NftMetadata>()
            .await
            .map_err(|e| AppError::Decode(format!("GET {}: {}", url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipfs_uris_rewrite_to_gateway() {
        assert_eq!(
            NftMetadataClient::gateway_url("ipfs://QmHash/1.json", IPFS_GATEWAY),
            "https://ipfs.loopring1.io/ipfs/QmHash/1.json"
        );
        assert_eq!(
            NftMetadataClient::gateway_url("https://example.com/1.json", IPFS_GATEWAY),
            "https://example.com/1.json"
        );
    }

    #[test]
    fn cache_evicts_oldest_at_capacity() {
        let cache = BoundedCache::new(2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        cache.insert("c".to_string(), 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn reinserting_refreshes_value_without_growing() {
        let cache = BoundedCache::new(2);
        cache.insert("a".to_string(), 1);
        cache.insert("a".to_string(), 9);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(9));
    }

    #[test]
    fn placeholder_names_the_failure() {
        let placeholder = NftMetadata::unavailable();
        assert_eq!(placeholder.name.as_deref(), Some("Couldn't fetch NFT details"));
        assert_eq!(placeholder.image.as_deref(), Some("/error"));
    }
}
