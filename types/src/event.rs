//! Events emitted after a verification decision is committed.

use serde::{Deserialize, Serialize};

use crate::id::{RequestId, UserId};
use crate::request::{VerificationRequest, VerificationStatus};
use crate::time::Timestamp;

/// A pending request was approved or rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReviewed {
    pub request_id: RequestId,
    pub user_id: UserId,
    pub status: VerificationStatus,
    pub reviewed_by: UserId,
    pub reviewed_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VerificationReviewed {
    /// Build the event from a finalized request. Returns `None` while the
    /// request is still pending.
    pub fn from_request(request: &VerificationRequest) -> Option<Self> {
        if !request.status.is_terminal() {
            return None;
        }
        Some(Self {
            request_id: request.id,
            user_id: request.user_id.clone(),
            status: request.status,
            reviewed_by: request.reviewed_by.clone()?,
            reviewed_at: request.reviewed_at?,
            reason: request.rejection_reason.clone(),
        })
    }
}
