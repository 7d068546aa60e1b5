//! Fundamental types for the verification service.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: identifiers, roles, document slots, timestamps and the
//! verification request record itself.

pub mod document;
pub mod error;
pub mod event;
pub mod id;
pub mod request;
pub mod role;
pub mod time;

pub use document::{BlobRef, DocumentSlot, VerificationDocument};
pub use error::TypeError;
pub use event::VerificationReviewed;
pub use id::{RequestId, UserId};
pub use request::{VerificationRequest, VerificationStatus};
pub use role::Role;
pub use time::{Clock, SystemClock, Timestamp};
