//! Session-local blob registry.
//!
//! Media dropped into the editor never touches a server; it lives in
//! memory and is referenced from the timeline by a `blob:` URI. This store
//! is the headless analog: bytes registered here resolve without any
//! network hop, and the URIs are valid only for the current session.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// URI scheme for in-memory media references.
pub const BLOB_SCHEME: &str = "blob:";

/// Shared, cheaply-clonable registry of in-memory media bytes.
#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    inner: Arc<RwLock<HashMap<String, Arc<Vec<u8>>>>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes under the given id and return the `blob:` URI that
    /// timeline items can use as a source reference.
    pub fn insert(&self, id: impl Into<String>, bytes: Vec<u8>) -> String {
        let id = id.into();
        let uri = format!("{BLOB_SCHEME}{id}");
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(bytes));
        uri
    }

    /// Resolve a `blob:` URI to its bytes.
    pub fn get(&self, uri: &str) -> Option<Arc<Vec<u8>>> {
        let id = uri.strip_prefix(BLOB_SCHEME)?;
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_returns_blob_uri() {
        let store = BlobStore::new();
        let uri = store.insert("clip-1", vec![1, 2, 3]);
        assert_eq!(uri, "blob:clip-1");
        assert_eq!(store.get(&uri).unwrap().as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_get_requires_blob_scheme() {
        let store = BlobStore::new();
        store.insert("clip-1", vec![1]);
        assert!(store.get("clip-1").is_none());
        assert!(store.get("http://example.com/clip-1").is_none());
    }

    #[test]
    fn test_clones_share_contents() {
        let store = BlobStore::new();
        let clone = store.clone();
        store.insert("shared", vec![9]);
        assert!(clone.get("blob:shared").is_some());
    }
}
