//! Verification request storage trait.

use crate::StoreError;
use vetting_types::{
    RequestId, Role, Timestamp, UserId, VerificationDocument, VerificationRequest,
    VerificationStatus,
};

/// A request that has passed intake and is ready to be persisted as `pending`.
/// The store allocates the id inside the same write that inserts it.
#[derive(Clone, Debug)]
pub struct NewRequest {
    pub user_id: UserId,
    pub role: Role,
    pub documents: Vec<VerificationDocument>,
    pub submitted_at: Timestamp,
}

impl NewRequest {
    /// Materialize the pending record under the allocated id.
    pub fn into_pending(self, id: RequestId) -> VerificationRequest {
        VerificationRequest {
            id,
            user_id: self.user_id,
            role: self.role,
            status: VerificationStatus::Pending,
            documents: self.documents,
            submitted_at: self.submitted_at,
            reviewed_at: None,
            reviewed_by: None,
            rejection_reason: None,
        }
    }
}

/// Result of a conditional insert.
#[derive(Clone, Debug)]
pub enum InsertOutcome {
    Inserted(VerificationRequest),
    /// The user already had an outstanding request; nothing was written.
    PendingExists(RequestId),
}

/// Result of a conditional update.
#[derive(Clone, Debug)]
pub enum UpdateOutcome {
    Updated(VerificationRequest),
    /// The persisted request was no longer pending; carries what is stored.
    NotPending(VerificationRequest),
    NotFound,
}

/// Listing filter. `None` fields match everything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub status: Option<VerificationStatus>,
    /// Role recorded on the request at submission.
    pub role: Option<Role>,
}

impl RequestFilter {
    pub fn matches(&self, request: &VerificationRequest) -> bool {
        self.status.map_or(true, |s| request.status == s)
            && self.role.map_or(true, |r| request.role == r)
    }
}

/// A window of listed requests plus the number of matches overall.
#[derive(Clone, Debug, Default)]
pub struct RequestPage {
    pub items: Vec<VerificationRequest>,
    pub total: u64,
}

/// Storage for verification requests and their secondary indexes.
///
/// The two mutating operations are conditional writes: the check and the
/// write happen atomically with respect to every other writer, so the
/// one-pending-request-per-user and pending-only-transition rules hold
/// under concurrent callers.
pub trait VerificationStore: Send + Sync {
    /// Insert `request` as pending unless the user already has a pending request.
    fn insert_pending(&self, request: NewRequest) -> Result<InsertOutcome, StoreError>;

    /// Replace the stored request with `updated` only if the stored copy is
    /// still pending. `updated.id` selects the record.
    fn update_if_pending(&self, updated: &VerificationRequest)
        -> Result<UpdateOutcome, StoreError>;

    fn get_request(&self, id: RequestId) -> Result<Option<VerificationRequest>, StoreError>;

    /// Id of the user's outstanding request, if any.
    fn pending_for_user(&self, user: &UserId) -> Result<Option<RequestId>, StoreError>;

    /// All of a user's requests, most recently submitted first.
    fn requests_for_user(&self, user: &UserId) -> Result<Vec<VerificationRequest>, StoreError>;

    /// The user's effective request: latest `submitted_at`, then highest id.
    fn latest_for_user(&self, user: &UserId) -> Result<Option<VerificationRequest>, StoreError> {
        Ok(self.requests_for_user(user)?.into_iter().next())
    }

    /// One window of the requests matching `filter`, most recently submitted
    /// first with ties broken by descending id. Only the `limit` records in
    /// the window are loaded; `total` counts every match.
    fn list_page(
        &self,
        filter: &RequestFilter,
        offset: u64,
        limit: usize,
    ) -> Result<RequestPage, StoreError>;

    /// Number of requests, optionally restricted to one status.
    fn count_requests(&self, status: Option<VerificationStatus>) -> Result<u64, StoreError> {
        let filter = RequestFilter {
            status,
            role: None,
        };
        self.list_page(&filter, 0, 0).map(|page| page.total)
    }
}
