use thiserror::Error;

use vetting_store::StoreError;
use vetting_types::{DocumentSlot, RequestId, Role, VerificationStatus};

/// A submission was refused at intake. User-correctable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("user id must be 1 to 128 characters with no control characters")]
    InvalidUserId,

    #[error("verification request {request_id} is still pending")]
    OutstandingRequestExists { request_id: RequestId },

    #[error("too many additional documents: {count} submitted, at most {max} allowed")]
    TooManyAdditionalDocuments { count: usize, max: usize },

    #[error("missing required document: {0}")]
    MissingRequiredDocument(DocumentSlot),

    #[error("document {0} has no storage reference")]
    MissingStorageReference(DocumentSlot),
}

/// A transition was attempted on a request that is no longer pending.
/// Indicates a lost race or a stale client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("verification request {request_id} was already {status}")]
    AlreadyFinalized {
        request_id: RequestId,
        status: VerificationStatus,
    },
}

/// Reviewer-side authorization or input failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("role {0} may not review verification requests")]
    Unauthorized(Role),

    #[error("verification request {0} not found")]
    NotFound(RequestId),

    #[error("a rejection requires a non-empty reason")]
    ReasonRequired,
}

/// Every failure a verification operation can produce.
///
/// Storage failures stay infrastructure errors and are never folded into
/// the domain variants.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl VerificationError {
    /// Short machine-readable code, used for logs and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Intake(IntakeError::InvalidUserId) => "invalid_user_id",
            Self::Intake(IntakeError::OutstandingRequestExists { .. }) => "outstanding_request_exists",
            Self::Intake(IntakeError::TooManyAdditionalDocuments { .. }) => {
                "too_many_additional_documents"
            }
            Self::Intake(IntakeError::MissingRequiredDocument(_)) => "missing_required_document",
            Self::Intake(IntakeError::MissingStorageReference(_)) => "missing_storage_reference",
            Self::State(StateError::AlreadyFinalized { .. }) => "already_finalized",
            Self::Review(ReviewError::Unauthorized(_)) => "unauthorized",
            Self::Review(ReviewError::NotFound(_)) => "not_found",
            Self::Review(ReviewError::ReasonRequired) => "reason_required",
            Self::Store(_) => "storage_error",
        }
    }
}
