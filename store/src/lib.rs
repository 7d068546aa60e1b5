//! Abstract collaborator traits for the verification service.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits, as do the document blob store and notification sinks. The rest of
//! the codebase depends only on the traits.

pub mod document;
pub mod error;
pub mod notify;
pub mod verification;

pub use document::DocumentStore;
pub use error::StoreError;
pub use notify::NotificationSink;
pub use verification::{
    InsertOutcome, NewRequest, RequestFilter, RequestPage, UpdateOutcome, VerificationStore,
};
