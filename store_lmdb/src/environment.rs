//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::meta::read_schema_version;
use crate::migration::migrate;
use crate::verification::LmdbVerificationStore;
use crate::LmdbError;

/// Names of every database the environment creates.
pub(crate) const DATABASES: &[&str] = &[
    "requests",
    "user_index",
    "status_index",
    "timeline",
    "pending",
    "meta",
];

/// Default LMDB map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    pub(crate) requests_db: Database<Bytes, Bytes>,
    pub(crate) user_index_db: Database<Bytes, Bytes>,
    pub(crate) status_index_db: Database<Bytes, Bytes>,
    pub(crate) timeline_db: Database<Bytes, Bytes>,
    pub(crate) pending_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path, create every
    /// database and bring the schema up to date.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process for this path and
        // the memory map is never accessed outside heed's transactions.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs.max(DATABASES.len() as u32))
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let requests_db = env.create_database(&mut wtxn, Some("requests"))?;
        let user_index_db = env.create_database(&mut wtxn, Some("user_index"))?;
        let status_index_db = env.create_database(&mut wtxn, Some("status_index"))?;
        let timeline_db = env.create_database(&mut wtxn, Some("timeline"))?;
        let pending_db = env.create_database(&mut wtxn, Some("pending"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let environment = Self {
            env: Arc::new(env),
            requests_db,
            user_index_db,
            status_index_db,
            timeline_db,
            pending_db,
            meta_db,
        };

        let version = migrate(&environment)?;
        tracing::info!(path = %path.display(), version, "opened LMDB environment");
        Ok(environment)
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// Handle implementing [`vetting_store::VerificationStore`].
    pub fn verification_store(&self) -> LmdbVerificationStore {
        LmdbVerificationStore {
            env: Arc::clone(&self.env),
            requests_db: self.requests_db,
            user_index_db: self.user_index_db,
            status_index_db: self.status_index_db,
            timeline_db: self.timeline_db,
            pending_db: self.pending_db,
            meta_db: self.meta_db,
        }
    }

    /// Schema version recorded in the meta database.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        read_schema_version(&self.meta_db, &rtxn)
    }
}
