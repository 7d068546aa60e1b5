//! Reviewer decisions.

use serde::Deserialize;

use vetting_store::{StoreError, VerificationStore};
use vetting_types::{RequestId, Role, Timestamp, UserId, VerificationRequest, VerificationReviewed};

use crate::error::{ReviewError, VerificationError};
use crate::state::{RejectionReason, ReviewDecision, Transition, VerificationStateMachine};

/// A reviewer's decision on one request.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCommand {
    pub request_id: RequestId,
    pub reviewer_id: UserId,
    pub reviewer_role: Role,
    pub decision: ReviewDecision,
    #[serde(default)]
    pub reason: Option<String>,
}

/// The committed request and the event describing the decision.
#[derive(Clone, Debug)]
pub struct ReviewOutcome {
    pub request: VerificationRequest,
    pub event: VerificationReviewed,
}

/// Validates reviewer authorization and input, then drives the state machine.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReviewEngine {
    state_machine: VerificationStateMachine,
}

impl ReviewEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate for every reviewer-only operation.
    pub fn authorize(&self, role: Role) -> Result<(), ReviewError> {
        if role.is_reviewer() {
            Ok(())
        } else {
            Err(ReviewError::Unauthorized(role))
        }
    }

    /// Checks run in a fixed order: authorization, existence, reason, then
    /// the guarded transition. Two reviewers racing on the same request both
    /// pass the first three; only one commit succeeds.
    pub fn review<S>(
        &self,
        store: &S,
        command: &ReviewCommand,
        now: Timestamp,
    ) -> Result<ReviewOutcome, VerificationError>
    where
        S: VerificationStore + ?Sized,
    {
        self.authorize(command.reviewer_role)?;

        let current = store
            .get_request(command.request_id)?
            .ok_or(ReviewError::NotFound(command.request_id))?;

        let transition = match command.decision {
            ReviewDecision::Approve => Transition::Approve,
            ReviewDecision::Reject => {
                Transition::Reject(RejectionReason::parse(command.reason.as_deref())?)
            }
        };

        let updated = self
            .state_machine
            .apply(&current, transition, &command.reviewer_id, now)?;
        let stored = self.state_machine.commit(store, &updated)?;

        let event = VerificationReviewed::from_request(&stored).ok_or_else(|| {
            StoreError::Corruption(format!(
                "request {} committed without review metadata",
                stored.id
            ))
        })?;
        Ok(ReviewOutcome {
            request: stored,
            event,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StateError;
    use std::sync::Arc;
    use std::thread;
    use vetting_nullables::NullVerificationStore;
    use vetting_store::{InsertOutcome, NewRequest};
    use vetting_types::VerificationStatus;

    fn seeded_store() -> (NullVerificationStore, RequestId) {
        let store = NullVerificationStore::new();
        let outcome = store
            .insert_pending(NewRequest {
                user_id: UserId::new("founder-1"),
                role: Role::Founder,
                documents: Vec::new(),
                submitted_at: Timestamp::new(100),
            })
            .unwrap();
        let InsertOutcome::Inserted(req) = outcome else {
            panic!("seed insert refused");
        };
        (store, req.id)
    }

    fn command(
        id: RequestId,
        role: Role,
        decision: ReviewDecision,
        reason: &str,
    ) -> ReviewCommand {
        ReviewCommand {
            request_id: id,
            reviewer_id: UserId::new("admin-1"),
            reviewer_role: role,
            decision,
            reason: Some(reason.to_string()),
        }
    }

    #[test]
    fn only_admins_review() {
        let (store, id) = seeded_store();
        let engine = ReviewEngine::new();
        for role in [Role::Founder, Role::Investor, Role::User] {
            let cmd = command(id, role, ReviewDecision::Approve, "");
            let err = engine.review(&store, &cmd, Timestamp::new(200)).unwrap_err();
            assert!(matches!(
                err,
                VerificationError::Review(ReviewError::Unauthorized(r)) if r == role
            ));
        }
        assert!(store.get_request(id).unwrap().unwrap().is_pending());
    }

    #[test]
    fn unauthorized_wins_over_not_found() {
        let (store, _) = seeded_store();
        let err = ReviewEngine::new()
            .review(
                &store,
                &command(RequestId::new(404), Role::User, ReviewDecision::Approve, ""),
                Timestamp::new(200),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            VerificationError::Review(ReviewError::Unauthorized(_))
        ));
    }

    #[test]
    fn unknown_request_is_not_found() {
        let (store, _) = seeded_store();
        let err = ReviewEngine::new()
            .review(
                &store,
                &command(RequestId::new(404), Role::Admin, ReviewDecision::Reject, ""),
                Timestamp::new(200),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            VerificationError::Review(ReviewError::NotFound(id)) if id == RequestId::new(404)
        ));
    }

    #[test]
    fn reject_without_reason_leaves_request_pending() {
        let (store, id) = seeded_store();
        let engine = ReviewEngine::new();
        for reason in ["", "   "] {
            let cmd = command(id, Role::Admin, ReviewDecision::Reject, reason);
            let err = engine.review(&store, &cmd, Timestamp::new(200)).unwrap_err();
            assert!(matches!(
                err,
                VerificationError::Review(ReviewError::ReasonRequired)
            ));
        }
        let mut no_reason = command(id, Role::Admin, ReviewDecision::Reject, "");
        no_reason.reason = None;
        assert!(engine.review(&store, &no_reason, Timestamp::new(200)).is_err());

        assert!(store.get_request(id).unwrap().unwrap().is_pending());
    }

    #[test]
    fn approval_ignores_reason_and_emits_event() {
        let (store, id) = seeded_store();
        let outcome = ReviewEngine::new()
            .review(
                &store,
                &command(id, Role::Admin, ReviewDecision::Approve, "looks fine"),
                Timestamp::new(250),
            )
            .unwrap();

        assert_eq!(outcome.request.status, VerificationStatus::Approved);
        assert!(outcome.request.rejection_reason.is_none());
        assert_eq!(outcome.request.reviewed_at, Some(Timestamp::new(250)));
        assert_eq!(outcome.event.request_id, id);
        assert_eq!(outcome.event.user_id, UserId::new("founder-1"));
        assert_eq!(outcome.event.status, VerificationStatus::Approved);
        assert!(outcome.event.reason.is_none());
    }

    #[test]
    fn second_review_is_already_finalized() {
        let (store, id) = seeded_store();
        let engine = ReviewEngine::new();
        let reject = command(id, Role::Admin, ReviewDecision::Reject, "forged");
        engine.review(&store, &reject, Timestamp::new(200)).unwrap();

        let approve = command(id, Role::Admin, ReviewDecision::Approve, "");
        let err = engine
            .review(&store, &approve, Timestamp::new(300))
            .unwrap_err();
        assert!(matches!(
            err,
            VerificationError::State(StateError::AlreadyFinalized {
                status: VerificationStatus::Rejected,
                ..
            })
        ));
        let stored = store.get_request(id).unwrap().unwrap();
        assert_eq!(stored.rejection_reason.as_deref(), Some("forged"));
    }

    #[test]
    fn concurrent_approve_and_reject_have_one_winner() {
        for _ in 0..20 {
            let (store, id) = seeded_store();
            let store = Arc::new(store);
            let handles: Vec<_> = [ReviewDecision::Approve, ReviewDecision::Reject]
                .into_iter()
                .map(|decision| {
                    let store = Arc::clone(&store);
                    thread::spawn(move || {
                        let cmd = command(id, Role::Admin, decision, "mismatch");
                        let result = ReviewEngine::new().review(&*store, &cmd, Timestamp::new(200));
                        (decision, result)
                    })
                })
                .collect();
            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

            let winners: Vec<_> = results.iter().filter(|(_, r)| r.is_ok()).collect();
            assert_eq!(winners.len(), 1);
            let loser = results.iter().find(|(_, r)| r.is_err()).unwrap();
            assert!(matches!(
                loser.1,
                Err(VerificationError::State(StateError::AlreadyFinalized { .. }))
            ));

            let expected = match winners[0].0 {
                ReviewDecision::Approve => VerificationStatus::Approved,
                ReviewDecision::Reject => VerificationStatus::Rejected,
            };
            assert_eq!(store.get_request(id).unwrap().unwrap().status, expected);
        }
    }

    #[test]
    fn review_command_deserializes_from_json() {
        let cmd: ReviewCommand = serde_json::from_str(
            r#"{"requestId":3,"reviewerId":"admin-1","reviewerRole":"admin","decision":"reject","reason":"blurry"}"#,
        )
        .unwrap();
        assert_eq!(cmd.request_id, RequestId::new(3));
        assert_eq!(cmd.decision, ReviewDecision::Reject);
        assert_eq!(cmd.reason.as_deref(), Some("blurry"));
    }
}
