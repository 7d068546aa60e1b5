//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the service starts
//! accepting submissions. Besides opening every database, the check
//! verifies that each pending guard entry points at a request that is still
//! pending. A stale guard would block the user from ever resubmitting.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use vetting_types::VerificationRequest;

use crate::environment::DATABASES;
use crate::keys::{decode_request_id, request_key};
use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check LMDB database integrity.
///
/// Read failures are recorded in the report rather than causing a hard error.
pub fn check_integrity(env: &Arc<Env>) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let rtxn = env.read_txn()?;

    for &db_name in DATABASES {
        match env.open_database::<Bytes, Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", db_name, e)),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{}' is missing", db_name)),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }

    let requests = env.open_database::<Bytes, Bytes>(&rtxn, Some("requests"))?;
    let pending = env.open_database::<Bytes, Bytes>(&rtxn, Some("pending"))?;
    if let (Some(requests), Some(pending)) = (requests, pending) {
        check_pending_guard(&rtxn, requests, pending, &mut report)?;
    }

    Ok(report)
}

/// Every guard entry must point at an existing request that is still pending.
fn check_pending_guard(
    rtxn: &heed::RoTxn<'_>,
    requests: Database<Bytes, Bytes>,
    pending: Database<Bytes, Bytes>,
    report: &mut IntegrityReport,
) -> Result<(), LmdbError> {
    for entry in pending.iter(rtxn)? {
        let (_user, id_bytes) = entry?;
        let id = match decode_request_id(id_bytes) {
            Ok(id) => id,
            Err(e) => {
                report.errors.push(format!("pending guard entry: {e}"));
                continue;
            }
        };
        match requests.get(rtxn, &request_key(id))? {
            None => report
                .errors
                .push(format!("pending guard points at missing request {id}")),
            Some(bytes) => match bincode::deserialize::<VerificationRequest>(bytes) {
                Ok(req) if req.is_pending() => {}
                Ok(req) => report.errors.push(format!(
                    "pending guard points at request {id} with status {}",
                    req.status
                )),
                Err(e) => report
                    .errors
                    .push(format!("request {id} does not deserialize: {e}")),
            },
        }
    }
    Ok(())
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists but `data.mdb` is missing, which suggests
/// corruption or misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_data_dir_fresh_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(&dir.path().join("not-created-yet")).is_ok());
    }

    #[test]
    fn check_data_dir_without_data_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(dir.path()).is_err());
    }

    #[test]
    fn unhealthy_report() {
        let report = IntegrityReport {
            databases_checked: 6,
            total_entries: 10,
            errors: vec!["pending guard points at missing request 4".to_string()],
        };
        assert!(!report.is_healthy());
    }
}
