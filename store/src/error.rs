use thiserror::Error;

/// Failure reported by a storage collaborator.
///
/// Domain refusals (a pending request already exists, a request is already
/// final) are not errors at this layer; they come back as outcome values.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record or blob under the given key or reference.
    #[error("no stored entry for {0}")]
    NotFound(String),

    /// The backend failed: I/O, a full map, an unreachable blob store.
    #[error("storage unavailable: {0}")]
    Backend(String),

    #[error("could not encode or decode stored value: {0}")]
    Serialization(String),

    /// Stored data violates an invariant the store itself maintains.
    #[error("stored data is inconsistent: {0}")]
    Corruption(String),
}
