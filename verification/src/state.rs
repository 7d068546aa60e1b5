//! The verification state machine.
//!
//! `pending` is the only non-terminal state. A request leaves it exactly once,
//! to `approved` or `rejected`, and a new request is the only way back to
//! `pending` for that user. Both guards (one pending request per user, no
//! transition out of a terminal state) are enforced by the store's
//! conditional writes, so racing callers cannot both win.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use vetting_store::{InsertOutcome, NewRequest, UpdateOutcome, VerificationStore};
use vetting_types::{Timestamp, UserId, VerificationRequest, VerificationStatus};

use crate::error::{IntakeError, ReviewError, StateError, VerificationError};

/// What a reviewer decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => f.write_str("approve"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for ReviewDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown decision: {other}")),
        }
    }
}

/// A trimmed, non-empty rejection reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectionReason(String);

impl RejectionReason {
    pub fn parse(raw: Option<&str>) -> Result<Self, ReviewError> {
        match raw.map(str::trim) {
            Some(reason) if !reason.is_empty() => Ok(Self(reason.to_string())),
            _ => Err(ReviewError::ReasonRequired),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A legal move out of `pending`. A rejection cannot be built without a reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Approve,
    Reject(RejectionReason),
}

impl Transition {
    pub fn target(&self) -> VerificationStatus {
        match self {
            Self::Approve => VerificationStatus::Approved,
            Self::Reject(_) => VerificationStatus::Rejected,
        }
    }
}

/// Single authority over a request's lifecycle status.
#[derive(Clone, Copy, Debug, Default)]
pub struct VerificationStateMachine;

impl VerificationStateMachine {
    /// Persist a new `pending` request unless the user already has one.
    pub fn open<S>(
        &self,
        store: &S,
        request: NewRequest,
    ) -> Result<VerificationRequest, VerificationError>
    where
        S: VerificationStore + ?Sized,
    {
        match store.insert_pending(request)? {
            InsertOutcome::Inserted(created) => Ok(created),
            InsertOutcome::PendingExists(request_id) => {
                Err(IntakeError::OutstandingRequestExists { request_id }.into())
            }
        }
    }

    /// Compute the finalized request without touching storage.
    pub fn apply(
        &self,
        request: &VerificationRequest,
        transition: Transition,
        reviewer: &UserId,
        at: Timestamp,
    ) -> Result<VerificationRequest, StateError> {
        if !request.is_pending() {
            return Err(StateError::AlreadyFinalized {
                request_id: request.id,
                status: request.status,
            });
        }

        let mut next = request.clone();
        next.status = transition.target();
        next.reviewed_at = Some(at);
        next.reviewed_by = Some(reviewer.clone());
        next.rejection_reason = match transition {
            Transition::Approve => None,
            Transition::Reject(reason) => Some(reason.0),
        };
        Ok(next)
    }

    /// Commit a finalized request. Fails with `AlreadyFinalized` if the
    /// persisted copy left `pending` since it was read.
    pub fn commit<S>(
        &self,
        store: &S,
        updated: &VerificationRequest,
    ) -> Result<VerificationRequest, VerificationError>
    where
        S: VerificationStore + ?Sized,
    {
        match store.update_if_pending(updated)? {
            UpdateOutcome::Updated(stored) => Ok(stored),
            UpdateOutcome::NotPending(current) => Err(StateError::AlreadyFinalized {
                request_id: current.id,
                status: current.status,
            }
            .into()),
            UpdateOutcome::NotFound => Err(ReviewError::NotFound(updated.id).into()),
        }
    }
}
