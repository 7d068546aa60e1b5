//! User-facing verification status.
//!
//! A pure read: the snapshot is derived from the user's most recent request
//! every time it is asked for and nothing is cached or written.

use std::fmt;

use serde::Serialize;

use vetting_store::{StoreError, VerificationStore};
use vetting_types::{RequestId, Timestamp, UserId, VerificationRequest, VerificationStatus};

/// Projected status. `None` means the user never submitted a request; it is
/// never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectedStatus {
    None,
    Pending,
    Approved,
    Rejected,
}

impl From<VerificationStatus> for ProjectedStatus {
    fn from(status: VerificationStatus) -> Self {
        match status {
            VerificationStatus::Pending => Self::Pending,
            VerificationStatus::Approved => Self::Approved,
            VerificationStatus::Rejected => Self::Rejected,
        }
    }
}

impl fmt::Display for ProjectedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub status: ProjectedStatus,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<Timestamp>,
}

impl StatusSnapshot {
    pub fn none() -> Self {
        Self {
            status: ProjectedStatus::None,
            is_verified: false,
            request_id: None,
            submitted_at: None,
            rejection_reason: None,
            reviewed_at: None,
        }
    }
}

impl From<&VerificationRequest> for StatusSnapshot {
    fn from(request: &VerificationRequest) -> Self {
        Self {
            status: request.status.into(),
            is_verified: request.status == VerificationStatus::Approved,
            request_id: Some(request.id),
            submitted_at: Some(request.submitted_at),
            rejection_reason: request.rejection_reason.clone(),
            reviewed_at: request.reviewed_at,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StatusProjection;

impl StatusProjection {
    /// Pick the effective request: latest `submitted_at`, ties to the higher id.
    pub fn effective<'a, I>(&self, requests: I) -> Option<&'a VerificationRequest>
    where
        I: IntoIterator<Item = &'a VerificationRequest>,
    {
        requests.into_iter().max_by_key(|r| r.recency_key())
    }

    pub fn project<'a, I>(&self, requests: I) -> StatusSnapshot
    where
        I: IntoIterator<Item = &'a VerificationRequest>,
    {
        self.effective(requests)
            .map(StatusSnapshot::from)
            .unwrap_or_else(StatusSnapshot::none)
    }

    pub fn status_of<S>(&self, store: &S, user: &UserId) -> Result<StatusSnapshot, StoreError>
    where
        S: VerificationStore + ?Sized,
    {
        Ok(store
            .latest_for_user(user)?
            .as_ref()
            .map(StatusSnapshot::from)
            .unwrap_or_else(StatusSnapshot::none))
    }
}
