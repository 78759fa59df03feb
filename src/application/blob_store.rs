//! In-process registry of transient object URLs
//!
//! Every URL handed out must be revoked by its owner. `live_count` exposes
//! leaks in tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const URL_PREFIX: &str = "blob:folder-recorder/";

/// Opaque reference to a registered blob
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered payload
#[derive(Debug, Clone)]
pub struct Blob {
    pub data: Arc<[u8]>,
    pub mime_type: String,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    blobs: HashMap<ObjectUrl, Blob>,
    created: u64,
    revoked: u64,
}

/// Shared handle to the registry
#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    inner: Arc<Mutex<Registry>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `data` and return a URL for it
    pub fn create_object_url(&self, data: Arc<[u8]>, mime_type: &str) -> ObjectUrl {
        let mut registry = self.registry();
        registry.next_id += 1;
        registry.created += 1;
        let url = ObjectUrl(format!("{}{}", URL_PREFIX, registry.next_id));
        registry.blobs.insert(
            url.clone(),
            Blob {
                data,
                mime_type: mime_type.to_string(),
            },
        );
        tracing::trace!(url = %url, "Object URL created");
        url
    }

    /// Release a URL. Returns false if it was unknown or already revoked.
    pub fn revoke_object_url(&self, url: &ObjectUrl) -> bool {
        let mut registry = self.registry();
        if registry.blobs.remove(url).is_some() {
            registry.revoked += 1;
            tracing::trace!(url = %url, "Object URL revoked");
            true
        } else {
            false
        }
    }

    pub fn resolve(&self, url: &ObjectUrl) -> Option<Blob> {
        self.registry().blobs.get(url).cloned()
    }

    /// URLs created and not yet revoked
    pub fn live_count(&self) -> usize {
        self.registry().blobs.len()
    }

    pub fn created_count(&self) -> u64 {
        self.registry().created
    }

    pub fn revoked_count(&self) -> u64 {
        self.registry().revoked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_resolve_revoke() {
        let store = BlobStore::new();
        let url = store.create_object_url(Arc::from(&b"abc"[..]), "audio/webm");

        assert!(url.as_str().starts_with("blob:"));
        let blob = store.resolve(&url).unwrap();
        assert_eq!(&*blob.data, b"abc");
        assert_eq!(blob.mime_type, "audio/webm");
        assert_eq!(store.live_count(), 1);

        assert!(store.revoke_object_url(&url));
        assert!(!store.revoke_object_url(&url));
        assert!(store.resolve(&url).is_none());
        assert_eq!(store.live_count(), 0);
        assert_eq!(store.created_count(), 1);
        assert_eq!(store.revoked_count(), 1);
    }

    #[test]
    fn urls_are_unique() {
        let store = BlobStore::new();
        let a = store.create_object_url(Arc::from(&b"a"[..]), "audio/webm");
        let b = store.create_object_url(Arc::from(&b"a"[..]), "audio/webm");
        assert_ne!(a, b);
    }

    #[test]
    fn clones_share_the_registry() {
        let store = BlobStore::new();
        let other = store.clone();
        let url = store.create_object_url(Arc::from(&b"x"[..]), "audio/webm");
        assert!(other.resolve(&url).is_some());
    }
}
