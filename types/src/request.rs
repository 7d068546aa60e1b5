//! The verification request record and its lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::document::{DocumentSlot, VerificationDocument};
use crate::error::TypeError;
use crate::id::{RequestId, UserId};
use crate::role::Role;
use crate::time::Timestamp;

/// Persisted lifecycle status of a request.
///
/// There is no persisted "none" status; users without any request are
/// represented at the projection layer only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub const ALL: [VerificationStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Approved and rejected requests never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Single-byte tag used as the leading component of status index keys.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Approved => 1,
            Self::Rejected => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Pending),
            1 => Some(Self::Approved),
            2 => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(TypeError::InvalidStatus(s.to_string())),
        }
    }
}

/// One submission attempt by a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub id: RequestId,
    pub user_id: UserId,
    /// Role of the submitter when the request was created. Authoritative for
    /// the lifetime of the request.
    pub role: Role,
    pub status: VerificationStatus,
    /// Sorted by slot.
    pub documents: Vec<VerificationDocument>,
    pub submitted_at: Timestamp,
    pub reviewed_at: Option<Timestamp>,
    pub reviewed_by: Option<UserId>,
    pub rejection_reason: Option<String>,
}

impl VerificationRequest {
    pub fn is_pending(&self) -> bool {
        self.status == VerificationStatus::Pending
    }

    pub fn document(&self, slot: DocumentSlot) -> Option<&VerificationDocument> {
        self.documents.iter().find(|d| d.slot == slot)
    }

    /// Key that orders requests by recency: later submission first, then the
    /// later-allocated id.
    pub fn recency_key(&self) -> (Timestamp, RequestId) {
        (self.submitted_at, self.id)
    }

    /// Whether this request takes precedence over `other` as a user's
    /// effective request.
    pub fn supersedes(&self, other: &VerificationRequest) -> bool {
        self.recency_key() > other.recency_key()
    }

    /// Check the status-dependent field invariants: review metadata is set iff
    /// the request is terminal, and a non-empty reason is set iff rejected.
    pub fn is_consistent(&self) -> bool {
        let reviewed = self.reviewed_at.is_some() && self.reviewed_by.is_some();
        let unreviewed = self.reviewed_at.is_none() && self.reviewed_by.is_none();
        let has_reason = self
            .rejection_reason
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty());

        match self.status {
            VerificationStatus::Pending => unreviewed && self.rejection_reason.is_none(),
            VerificationStatus::Approved => reviewed && self.rejection_reason.is_none(),
            VerificationStatus::Rejected => reviewed && has_reason,
        }
    }
}
