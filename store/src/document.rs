//! Document blob storage trait.

use crate::StoreError;
use vetting_types::{BlobRef, DocumentSlot};

/// Interface of the external blob store that holds uploaded documents.
///
/// The verification core only ever sees the returned [`BlobRef`]; bytes stay
/// with the collaborator. Retry policy belongs to implementations.
pub trait DocumentStore: Send + Sync {
    /// Persist a payload uploaded for `slot` and return a stable reference.
    fn store(&self, slot: DocumentSlot, bytes: &[u8]) -> Result<BlobRef, StoreError>;

    /// Retrieve a previously stored payload.
    fn fetch(&self, blob: &BlobRef) -> Result<Vec<u8>, StoreError>;
}
