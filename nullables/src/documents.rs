//! Nullable document store: in-memory blobs with an optional failure switch.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use vetting_store::{DocumentStore, StoreError};
use vetting_types::{BlobRef, DocumentSlot};

/// In-memory [`DocumentStore`]. References are `mem://<n>/<slot>`.
#[derive(Default)]
pub struct NullDocumentStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    next: AtomicU64,
    failing: AtomicBool,
}

impl NullDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `store` call fail with a backend error.
    pub fn fail_uploads(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of blobs stored so far.
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for NullDocumentStore {
    fn store(&self, slot: DocumentSlot, bytes: &[u8]) -> Result<BlobRef, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!("upload of {slot} refused")));
        }
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let blob = BlobRef::new(format!("mem://{n}/{slot}"));
        self.blobs
            .lock()
            .unwrap()
            .insert(blob.as_str().to_string(), bytes.to_vec());
        Ok(blob)
    }

    fn fetch(&self, blob: &BlobRef) -> Result<Vec<u8>, StoreError> {
        self.blobs
            .lock()
            .unwrap()
            .get(blob.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(blob.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_bytes_can_be_fetched() {
        let docs = NullDocumentStore::new();
        let a = docs.store(DocumentSlot::IdDocument, b"passport").unwrap();
        let b = docs.store(DocumentSlot::IdDocument, b"passport").unwrap();

        assert_ne!(a, b);
        assert_eq!(docs.fetch(&a).unwrap(), b"passport");
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn failure_switch() {
        let docs = NullDocumentStore::new();
        docs.fail_uploads(true);
        assert!(docs.store(DocumentSlot::ProofOfAddress, b"bill").is_err());
        assert!(docs.is_empty());

        docs.fail_uploads(false);
        assert!(docs.store(DocumentSlot::ProofOfAddress, b"bill").is_ok());
    }

    #[test]
    fn unknown_blob_is_not_found() {
        let docs = NullDocumentStore::new();
        let err = docs.fetch(&BlobRef::new("mem://404/idDocument")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
