//! Schema versioning for the verification databases.
//!
//! The meta database records which layout the files were written with. On
//! open, any missing steps are applied in order and the version is bumped
//! in the same write transaction, so a crash mid-upgrade leaves the old
//! version in place.

use heed::RwTxn;

use vetting_types::VerificationRequest;

use crate::environment::LmdbEnvironment;
use crate::keys::{role_value, status_index_key, timeline_key};
use crate::meta::{read_schema_version, write_schema_version};
use crate::LmdbError;

/// Layout written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

type Step = fn(&LmdbEnvironment, &mut RwTxn<'_>) -> Result<(), LmdbError>;

/// `STEPS[n]` upgrades version `n` to `n + 1`.
const STEPS: &[Step] = &[initial_layout, role_tagged_indexes];

/// Version 1: requests, the user/status/timeline indexes and the pending
/// guard. Databases are created by the environment, nothing to rewrite.
fn initial_layout(_env: &LmdbEnvironment, _wtxn: &mut RwTxn<'_>) -> Result<(), LmdbError> {
    Ok(())
}

/// Version 2: status and timeline entries carry the submitter's role tag
/// instead of an empty value.
fn role_tagged_indexes(env: &LmdbEnvironment, wtxn: &mut RwTxn<'_>) -> Result<(), LmdbError> {
    let mut entries = Vec::new();
    for entry in env.requests_db.iter(&**wtxn)? {
        let (_, bytes) = entry?;
        let request: VerificationRequest = bincode::deserialize(bytes)?;
        entries.push((
            status_index_key(request.status, request.submitted_at, request.id),
            timeline_key(request.submitted_at, request.id),
            role_value(request.role),
        ));
    }
    for (status_key, timeline, role) in &entries {
        env.status_index_db.put(wtxn, status_key, role)?;
        env.timeline_db.put(wtxn, timeline, role)?;
    }
    tracing::debug!(requests = entries.len(), "role tags written to listing indexes");
    Ok(())
}

/// Bring the environment up to [`CURRENT_SCHEMA_VERSION`].
///
/// Files written by a newer build are refused rather than reinterpreted.
pub fn migrate(env: &LmdbEnvironment) -> Result<u32, LmdbError> {
    let mut wtxn = env.env().write_txn()?;
    let found = read_schema_version(&env.meta_db, &wtxn)?;

    if found > CURRENT_SCHEMA_VERSION {
        return Err(LmdbError::SchemaTooNew {
            found,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }
    if found == CURRENT_SCHEMA_VERSION {
        tracing::debug!(version = found, "schema up to date");
        return Ok(found);
    }

    for (version, step) in STEPS.iter().enumerate().skip(found as usize) {
        tracing::info!(from = version, to = version + 1, "applying schema step");
        step(env, &mut wtxn)?;
    }
    write_schema_version(&env.meta_db, &mut wtxn, CURRENT_SCHEMA_VERSION)?;
    wtxn.commit()?;

    tracing::info!(version = CURRENT_SCHEMA_VERSION, "schema migrated");
    Ok(CURRENT_SCHEMA_VERSION)
}
