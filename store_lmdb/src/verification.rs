//! LMDB implementation of VerificationStore.
//!
//! Each mutating call runs in one write transaction. LMDB admits a single
//! writer at a time, so the guard read (pending table, current status) and
//! the write it protects cannot interleave with another writer.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use vetting_store::{
    InsertOutcome, NewRequest, RequestFilter, RequestPage, StoreError, UpdateOutcome,
    VerificationStore,
};
use vetting_types::{RequestId, UserId, VerificationRequest, VerificationStatus};

use crate::keys::{
    decode_request_id, decode_role_value, prefix_bounds, request_key, role_value,
    status_index_key, timeline_key, trailing_request_id, user_index_key, user_prefix,
};
use crate::meta::allocate_request_id;
use crate::LmdbError;

const EMPTY: &[u8] = &[];

pub struct LmdbVerificationStore {
    pub(crate) env: Arc<Env>,
    pub(crate) requests_db: Database<Bytes, Bytes>,
    pub(crate) user_index_db: Database<Bytes, Bytes>,
    pub(crate) status_index_db: Database<Bytes, Bytes>,
    pub(crate) timeline_db: Database<Bytes, Bytes>,
    pub(crate) pending_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

fn as_slices(bounds: &(Bound<Vec<u8>>, Bound<Vec<u8>>)) -> (Bound<&[u8]>, Bound<&[u8]>) {
    (
        bounds.0.as_ref().map(Vec::as_slice),
        bounds.1.as_ref().map(Vec::as_slice),
    )
}

impl LmdbVerificationStore {
    fn read_request(
        &self,
        txn: &RoTxn<'_>,
        id: RequestId,
    ) -> Result<Option<VerificationRequest>, LmdbError> {
        match self.requests_db.get(txn, &request_key(id))? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    /// Resolve index keys (newest first) under `prefix` to their records.
    fn collect_rev(
        &self,
        txn: &RoTxn<'_>,
        index: &Database<Bytes, Bytes>,
        prefix: &[u8],
    ) -> Result<Vec<VerificationRequest>, LmdbError> {
        let bounds = prefix_bounds(prefix);
        let mut ids = Vec::new();
        for entry in index.rev_range(txn, &as_slices(&bounds))? {
            let (key, _) = entry?;
            ids.push(trailing_request_id(key)?);
        }
        self.resolve(txn, ids)
    }

    fn resolve(
        &self,
        txn: &RoTxn<'_>,
        ids: Vec<RequestId>,
    ) -> Result<Vec<VerificationRequest>, LmdbError> {
        ids.into_iter()
            .map(|id| {
                self.read_request(txn, id)?.ok_or_else(|| {
                    LmdbError::Corruption(format!("index points at missing request {id}"))
                })
            })
            .collect()
    }
}

impl VerificationStore for LmdbVerificationStore {
    fn insert_pending(&self, request: NewRequest) -> Result<InsertOutcome, StoreError> {
        let guard_key = user_prefix(&request.user_id)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let existing = self
            .pending_db
            .get(&wtxn, &guard_key)
            .map_err(LmdbError::from)?
            .map(decode_request_id)
            .transpose()?;
        if let Some(existing) = existing {
            // Dropping the transaction aborts it; nothing was written.
            return Ok(InsertOutcome::PendingExists(existing));
        }

        let id = allocate_request_id(&self.meta_db, &mut wtxn)?;
        let record = request.into_pending(id);
        let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;
        let role = role_value(record.role);

        self.requests_db
            .put(&mut wtxn, &request_key(id), &bytes)
            .map_err(LmdbError::from)?;
        self.user_index_db
            .put(
                &mut wtxn,
                &user_index_key(&record.user_id, record.submitted_at, id)?,
                EMPTY,
            )
            .map_err(LmdbError::from)?;
        self.status_index_db
            .put(
                &mut wtxn,
                &status_index_key(record.status, record.submitted_at, id),
                &role,
            )
            .map_err(LmdbError::from)?;
        self.timeline_db
            .put(&mut wtxn, &timeline_key(record.submitted_at, id), &role)
            .map_err(LmdbError::from)?;
        self.pending_db
            .put(&mut wtxn, &guard_key, &request_key(id))
            .map_err(LmdbError::from)?;

        wtxn.commit().map_err(LmdbError::from)?;
        Ok(InsertOutcome::Inserted(record))
    }

    fn update_if_pending(
        &self,
        updated: &VerificationRequest,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let Some(current) = self.read_request(&wtxn, updated.id)? else {
            return Ok(UpdateOutcome::NotFound);
        };
        if !current.is_pending() {
            return Ok(UpdateOutcome::NotPending(current));
        }
        if current.user_id != updated.user_id
            || current.submitted_at != updated.submitted_at
            || current.role != updated.role
        {
            return Err(LmdbError::InvalidUpdate(format!(
                "request {} owner, role and submission time are immutable",
                updated.id
            ))
            .into());
        }

        let bytes = bincode::serialize(updated).map_err(LmdbError::from)?;
        self.requests_db
            .put(&mut wtxn, &request_key(updated.id), &bytes)
            .map_err(LmdbError::from)?;

        if updated.status != current.status {
            self.status_index_db
                .delete(
                    &mut wtxn,
                    &status_index_key(current.status, current.submitted_at, current.id),
                )
                .map_err(LmdbError::from)?;
            self.status_index_db
                .put(
                    &mut wtxn,
                    &status_index_key(updated.status, updated.submitted_at, updated.id),
                    &role_value(updated.role),
                )
                .map_err(LmdbError::from)?;
        }
        if !updated.is_pending() {
            self.pending_db
                .delete(&mut wtxn, &user_prefix(&updated.user_id)?)
                .map_err(LmdbError::from)?;
        }

        wtxn.commit().map_err(LmdbError::from)?;
        Ok(UpdateOutcome::Updated(updated.clone()))
    }

    fn get_request(&self, id: RequestId) -> Result<Option<VerificationRequest>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.read_request(&rtxn, id)?)
    }

    fn pending_for_user(&self, user: &UserId) -> Result<Option<RequestId>, StoreError> {
        // An id too long to be a key was never stored.
        let Ok(guard_key) = user_prefix(user) else {
            return Ok(None);
        };
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let id = self
            .pending_db
            .get(&rtxn, &guard_key)
            .map_err(LmdbError::from)?
            .map(decode_request_id)
            .transpose()?;
        Ok(id)
    }

    fn requests_for_user(&self, user: &UserId) -> Result<Vec<VerificationRequest>, StoreError> {
        let Ok(prefix) = user_prefix(user) else {
            return Ok(Vec::new());
        };
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.collect_rev(&rtxn, &self.user_index_db, &prefix)?)
    }

    fn list_page(
        &self,
        filter: &RequestFilter,
        offset: u64,
        limit: usize,
    ) -> Result<RequestPage, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let (index, prefix) = match filter.status {
            Some(status) => (&self.status_index_db, vec![status.tag()]),
            None => (&self.timeline_db, Vec::new()),
        };
        // Without filters the table size is the total, so the walk can stop
        // once the window is full.
        let known_total = match (filter.status, filter.role) {
            (None, None) => Some(self.timeline_db.len(&rtxn).map_err(LmdbError::from)?),
            _ => None,
        };

        let bounds = prefix_bounds(&prefix);
        let mut matched = 0u64;
        let mut ids = Vec::new();
        for entry in index
            .rev_range(&rtxn, &as_slices(&bounds))
            .map_err(LmdbError::from)?
        {
            if known_total.is_some() && ids.len() == limit {
                break;
            }
            let (key, value) = entry.map_err(LmdbError::from)?;
            if let Some(role) = filter.role {
                if decode_role_value(value)? != role {
                    continue;
                }
            }
            if matched >= offset && ids.len() < limit {
                ids.push(trailing_request_id(key)?);
            }
            matched += 1;
        }

        let items = self.resolve(&rtxn, ids)?;
        Ok(RequestPage {
            items,
            total: known_total.unwrap_or(matched),
        })
    }

    fn count_requests(&self, status: Option<VerificationStatus>) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = match status {
            None => self.requests_db.len(&rtxn).map_err(LmdbError::from)?,
            Some(status) => {
                let bounds = prefix_bounds(&[status.tag()]);
                let mut n = 0u64;
                for entry in self
                    .status_index_db
                    .range(&rtxn, &as_slices(&bounds))
                    .map_err(LmdbError::from)?
                {
                    entry.map_err(LmdbError::from)?;
                    n += 1;
                }
                n
            }
        };
        Ok(count)
    }
}
