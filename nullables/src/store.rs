//! Nullable store: thread-safe in-memory verification storage for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use vetting_store::{
    InsertOutcome, NewRequest, RequestFilter, RequestPage, StoreError, UpdateOutcome,
    VerificationStore,
};
use vetting_types::{RequestId, UserId, VerificationRequest};

#[derive(Default)]
struct State {
    requests: BTreeMap<RequestId, VerificationRequest>,
    pending: HashMap<UserId, RequestId>,
    last_id: u64,
}

impl State {
    /// Matching records sorted newest first, by reference.
    fn newest_first<'a>(
        &'a self,
        keep: impl Fn(&VerificationRequest) -> bool,
    ) -> Vec<&'a VerificationRequest> {
        let mut out: Vec<_> = self.requests.values().filter(|r| keep(r)).collect();
        out.sort_by_key(|r| std::cmp::Reverse(r.recency_key()));
        out
    }
}

/// An in-memory [`VerificationStore`].
///
/// One mutex covers all state, so each conditional write checks and mutates
/// under a single lock acquisition, like an LMDB write transaction.
#[derive(Default)]
pub struct NullVerificationStore {
    state: Mutex<State>,
}

impl NullVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the pending guard. Lets tests build
    /// histories with explicit ids and timestamps.
    pub fn put_request(&self, request: VerificationRequest) {
        let mut state = self.state.lock().unwrap();
        state.last_id = state.last_id.max(request.id.as_u64());
        if request.is_pending() {
            state.pending.insert(request.user_id.clone(), request.id);
        }
        state.requests.insert(request.id, request);
    }
}

impl VerificationStore for NullVerificationStore {
    fn insert_pending(&self, request: NewRequest) -> Result<InsertOutcome, StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(&existing) = state.pending.get(&request.user_id) {
            return Ok(InsertOutcome::PendingExists(existing));
        }
        state.last_id += 1;
        let record = request.into_pending(RequestId::new(state.last_id));
        state.pending.insert(record.user_id.clone(), record.id);
        state.requests.insert(record.id, record.clone());
        Ok(InsertOutcome::Inserted(record))
    }

    fn update_if_pending(
        &self,
        updated: &VerificationRequest,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut state = self.state.lock().unwrap();
        let Some(current) = state.requests.get(&updated.id) else {
            return Ok(UpdateOutcome::NotFound);
        };
        if !current.is_pending() {
            return Ok(UpdateOutcome::NotPending(current.clone()));
        }
        if current.user_id != updated.user_id || current.submitted_at != updated.submitted_at {
            return Err(StoreError::Backend(format!(
                "request {} owner and submission time are immutable",
                updated.id
            )));
        }
        if !updated.is_pending() {
            state.pending.remove(&updated.user_id);
        }
        state.requests.insert(updated.id, updated.clone());
        Ok(UpdateOutcome::Updated(updated.clone()))
    }

    fn get_request(&self, id: RequestId) -> Result<Option<VerificationRequest>, StoreError> {
        Ok(self.state.lock().unwrap().requests.get(&id).cloned())
    }

    fn pending_for_user(&self, user: &UserId) -> Result<Option<RequestId>, StoreError> {
        Ok(self.state.lock().unwrap().pending.get(user).copied())
    }

    fn requests_for_user(&self, user: &UserId) -> Result<Vec<VerificationRequest>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .newest_first(|r| &r.user_id == user)
            .into_iter()
            .cloned()
            .collect())
    }

    fn list_page(
        &self,
        filter: &RequestFilter,
        offset: u64,
        limit: usize,
    ) -> Result<RequestPage, StoreError> {
        let state = self.state.lock().unwrap();
        let matching = state.newest_first(|r| filter.matches(r));
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit)
            .cloned()
            .collect();
        Ok(RequestPage { items, total })
    }
}
