//! In-memory blob storage addressed by `blob:` URLs

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Origin used when none is configured
pub const DEFAULT_ORIGIN: &str = "dashdoc";

/// Reference to bytes held in a [`BlobStore`], shaped `blob:<origin>/<uuid>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobUrl(String);

impl BlobUrl {
    /// Parse a `blob:` URL, returning `None` if it is not one
    pub fn parse(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("blob:")?;
        let (origin, id) = rest.rsplit_once('/')?;
        if origin.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing path segment of the URL
    pub fn suffix(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bytes and content type of a stored blob
#[derive(Debug, Clone)]
pub struct Blob {
    pub bytes: Arc<Vec<u8>>,
    pub content_type: String,
}

/// Shared map of live blobs
///
/// Cloning is cheap; all clones see the same blobs. A blob stays readable
/// until it is revoked or every clone of the store is dropped.
#[derive(Clone)]
pub struct BlobStore {
    origin: Arc<str>,
    blobs: Arc<DashMap<String, Blob>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::with_origin(DEFAULT_ORIGIN)
    }

    pub fn with_origin(origin: &str) -> Self {
        Self {
            origin: Arc::from(origin),
            blobs: Arc::new(DashMap::new()),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Store bytes under a fresh URL
    pub fn insert(&self, bytes: Vec<u8>, content_type: &str) -> BlobUrl {
        let url = BlobUrl(format!("blob:{}/{}", self.origin, Uuid::new_v4()));
        self.blobs.insert(
            url.0.clone(),
            Blob {
                bytes: Arc::new(bytes),
                content_type: content_type.to_string(),
            },
        );
        url
    }

    pub fn get(&self, url: &BlobUrl) -> Option<Blob> {
        self.blobs.get(url.as_str()).map(|entry| entry.value().clone())
    }

    /// Release a blob; returns whether it was still live
    pub fn revoke(&self, url: &BlobUrl) -> bool {
        self.blobs.remove(url.as_str()).is_some()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl Default for BlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStore")
            .field("origin", &self.origin)
            .field("blobs", &self.blobs.len())
            .finish()
    }
}
