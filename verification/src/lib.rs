//! Founder and investor verification.
//!
//! A user files identity (and, for founders, business) documents; an admin
//! approves or rejects the resulting request.
//!
//! - **Intake** checks role-conditioned completeness and creates a `pending`
//!   request, at most one per user.
//! - **State machine** owns the lifecycle: `pending` moves once, to
//!   `approved` or `rejected`. A rejected user re-submits with a new request.
//! - **Review** authorizes the reviewer and records the decision.
//! - **Projection** derives what the user sees from their latest request.
//! - **Queue** pages through all requests for administrators.
//!
//! The storage guards are conditional writes in the store, so the rules hold
//! under concurrent callers.

pub mod error;
pub mod intake;
pub mod notify;
pub mod projection;
pub mod queue;
pub mod requirements;
pub mod review;
pub mod service;
pub mod state;

pub use error::{IntakeError, ReviewError, StateError, VerificationError};
pub use intake::{upload_documents, IntakeValidator, SubmittedDocuments};
pub use notify::LoggingSink;
pub use projection::{ProjectedStatus, StatusProjection, StatusSnapshot};
pub use queue::{Page, PageLimits, Pagination, QueueQuery, ReviewQueue};
pub use requirements::DocumentRequirements;
pub use review::{ReviewCommand, ReviewEngine, ReviewOutcome};
pub use service::{Actor, VerificationService};
pub use state::{RejectionReason, ReviewDecision, Transition, VerificationStateMachine};
