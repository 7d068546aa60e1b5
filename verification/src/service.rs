//! Verification service: connects intake, the state machine, review,
//! projection and the queue to a store, a clock and a notification sink.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use vetting_store::{DocumentStore, NotificationSink, VerificationStore};
use vetting_types::{Clock, DocumentSlot, RequestId, Role, UserId, VerificationRequest};
use vetting_utils::spans;

use crate::error::{IntakeError, ReviewError, VerificationError};
use crate::intake::{upload_documents, IntakeValidator, SubmittedDocuments};
use crate::notify::LoggingSink;
use crate::projection::{StatusProjection, StatusSnapshot};
use crate::queue::{Page, PageLimits, QueueQuery, ReviewQueue};
use crate::requirements::DocumentRequirements;
use crate::review::{ReviewCommand, ReviewEngine, ReviewOutcome};
use crate::state::{ReviewDecision, VerificationStateMachine};

/// The authenticated caller, as reported by the identity collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// A user may see their own records; reviewers may see everyone's.
    pub fn can_view(&self, user: &UserId) -> bool {
        &self.id == user || self.role.is_reviewer()
    }
}

pub struct VerificationService {
    store: Arc<dyn VerificationStore>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
    intake: IntakeValidator,
    state_machine: VerificationStateMachine,
    reviews: ReviewEngine,
    projection: StatusProjection,
    queue: ReviewQueue,
}

impl VerificationService {
    pub fn new(store: Arc<dyn VerificationStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            sink: Arc::new(LoggingSink),
            intake: IntakeValidator::default(),
            state_machine: VerificationStateMachine,
            reviews: ReviewEngine::new(),
            projection: StatusProjection,
            queue: ReviewQueue::default(),
        }
    }

    pub fn with_requirements(mut self, requirements: DocumentRequirements) -> Self {
        self.intake = IntakeValidator::new(requirements);
        self
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.queue = ReviewQueue::new(limits);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn requirements(&self) -> &DocumentRequirements {
        self.intake.requirements()
    }

    // ── Submitter operations ─────────────────────────────────────────────

    /// Create a `pending` request from already-uploaded documents.
    pub fn submit(
        &self,
        actor: &Actor,
        documents: SubmittedDocuments,
    ) -> Result<VerificationRequest, VerificationError> {
        let _span = spans::submit_span(&actor.id, &actor.role).entered();

        let result = ensure_valid_user(&actor.id)
            .and_then(|()| self.ensure_no_pending(&actor.id))
            .and_then(|()| {
                let new = self.intake.prepare(
                    actor.id.clone(),
                    actor.role,
                    documents,
                    self.clock.now(),
                )?;
                self.state_machine.open(self.store.as_ref(), new)
            });

        match &result {
            Ok(request) => info!(
                request_id = %request.id,
                documents = request.documents.len(),
                "verification request submitted"
            ),
            Err(e) => warn!(code = e.code(), error = %e, "submission refused"),
        }
        result
    }

    /// Upload every payload to `documents`, then submit. No request is
    /// created if any upload fails.
    pub fn submit_uploads<D>(
        &self,
        actor: &Actor,
        uploads: BTreeMap<DocumentSlot, Vec<u8>>,
        documents: &D,
    ) -> Result<VerificationRequest, VerificationError>
    where
        D: DocumentStore + ?Sized,
    {
        // Refuse early so a doomed submission does not leave orphan blobs.
        ensure_valid_user(&actor.id)?;
        self.ensure_no_pending(&actor.id)?;
        let refs = upload_documents(documents, uploads).map_err(|e| {
            warn!(user_id = %actor.id, error = %e, "document upload failed");
            e
        })?;
        self.submit(actor, refs)
    }

    /// Fast-path check. The store's conditional insert remains the guard
    /// that holds under concurrent submissions.
    fn ensure_no_pending(&self, user: &UserId) -> Result<(), VerificationError> {
        match self.store.pending_for_user(user)? {
            Some(request_id) => Err(IntakeError::OutstandingRequestExists { request_id }.into()),
            None => Ok(()),
        }
    }

    /// Current verification snapshot for `user`. Pure read.
    pub fn status_of(&self, user: &UserId) -> Result<StatusSnapshot, VerificationError> {
        let snapshot = self.projection.status_of(self.store.as_ref(), user)?;
        debug!(user_id = %user, status = %snapshot.status, "status projected");
        Ok(snapshot)
    }

    /// Every request `user` has submitted, newest first.
    pub fn history(
        &self,
        actor: &Actor,
        user: &UserId,
    ) -> Result<Vec<VerificationRequest>, VerificationError> {
        if !actor.can_view(user) {
            return Err(ReviewError::Unauthorized(actor.role).into());
        }
        Ok(self.store.requests_for_user(user)?)
    }

    // ── Reviewer operations ──────────────────────────────────────────────

    /// Approve or reject a pending request and publish the decision.
    pub fn review(
        &self,
        actor: &Actor,
        request_id: RequestId,
        decision: ReviewDecision,
        reason: Option<String>,
    ) -> Result<ReviewOutcome, VerificationError> {
        let _span = spans::review_span(&request_id, &actor.id, &decision).entered();

        let command = ReviewCommand {
            request_id,
            reviewer_id: actor.id.clone(),
            reviewer_role: actor.role,
            decision,
            reason,
        };
        let outcome = self
            .reviews
            .review(self.store.as_ref(), &command, self.clock.now())
            .map_err(|e| {
                warn!(code = e.code(), error = %e, "review refused");
                e
            })?;

        info!(
            user_id = %outcome.request.user_id,
            status = %outcome.request.status,
            "verification request reviewed"
        );
        self.sink.publish(&outcome.event);
        Ok(outcome)
    }

    /// One page of the review queue.
    pub fn list(
        &self,
        actor: &Actor,
        query: &QueueQuery,
    ) -> Result<Page<VerificationRequest>, VerificationError> {
        let page = self.queue.list(self.store.as_ref(), actor.role, query)?;
        debug!(
            page = page.pagination.page,
            returned = page.items.len(),
            total = page.pagination.total,
            "review queue listed"
        );
        Ok(page)
    }

    /// A single request. Reviewers see any request; others only their own.
    pub fn get(
        &self,
        actor: &Actor,
        request_id: RequestId,
    ) -> Result<VerificationRequest, VerificationError> {
        match self.store.get_request(request_id)? {
            Some(request) if actor.can_view(&request.user_id) => Ok(request),
            Some(_) => Err(ReviewError::Unauthorized(actor.role).into()),
            None if actor.role.is_reviewer() => Err(ReviewError::NotFound(request_id).into()),
            None => Err(ReviewError::Unauthorized(actor.role).into()),
        }
    }
}

/// Ids reach the service from the identity layer unchecked; anything that
/// could not be a storage key is refused as a user error.
fn ensure_valid_user(user: &UserId) -> Result<(), VerificationError> {
    if user.is_valid() {
        Ok(())
    } else {
        Err(IntakeError::InvalidUserId.into())
    }
}
