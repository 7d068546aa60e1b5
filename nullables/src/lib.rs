//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator of the verification core (clock, request storage,
//! document storage, notifications) is abstracted behind a trait. This crate
//! provides test-friendly implementations that return deterministic values,
//! can be controlled programmatically and never touch the filesystem or
//! network.
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod documents;
pub mod notify;
pub mod store;

pub use clock::NullClock;
pub use documents::NullDocumentStore;
pub use notify::RecordingNotifier;
pub use store::NullVerificationStore;
