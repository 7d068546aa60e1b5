//! Metadata database: schema version and the request id counter.

use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};

use vetting_types::RequestId;

use crate::LmdbError;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";
const NEXT_REQUEST_ID_KEY: &[u8] = b"next_request_id";

/// Stored schema version, `0` for a database that was never stamped.
pub(crate) fn read_schema_version(
    meta_db: &Database<Bytes, Bytes>,
    txn: &RoTxn<'_>,
) -> Result<u32, LmdbError> {
    match meta_db.get(txn, SCHEMA_VERSION_KEY)? {
        Some(bytes) => {
            let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                LmdbError::Corruption("schema_version has unexpected byte length".into())
            })?;
            Ok(u32::from_be_bytes(arr))
        }
        None => Ok(0),
    }
}

pub(crate) fn write_schema_version(
    meta_db: &Database<Bytes, Bytes>,
    wtxn: &mut RwTxn<'_>,
    version: u32,
) -> Result<(), LmdbError> {
    meta_db.put(wtxn, SCHEMA_VERSION_KEY, &version.to_be_bytes())?;
    Ok(())
}

/// Allocate the next request id inside the caller's write transaction, so the
/// id is only consumed if the surrounding insert commits.
pub(crate) fn allocate_request_id(
    meta_db: &Database<Bytes, Bytes>,
    wtxn: &mut RwTxn<'_>,
) -> Result<RequestId, LmdbError> {
    let next = match meta_db.get(wtxn, NEXT_REQUEST_ID_KEY)? {
        Some(bytes) => {
            let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                LmdbError::Corruption("next_request_id has unexpected byte length".into())
            })?;
            u64::from_be_bytes(arr)
        }
        None => 1,
    };
    meta_db.put(wtxn, NEXT_REQUEST_ID_KEY, &next.saturating_add(1).to_be_bytes())?;
    Ok(RequestId::new(next))
}
