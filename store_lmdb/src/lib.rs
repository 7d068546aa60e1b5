//! LMDB storage backend for verification requests.
//!
//! Implements the `vetting-store` traits using the `heed` LMDB bindings.
//! Requests live in one database; secondary indexes (per user, per status,
//! global timeline) and the one-pending-per-user guard live in others, all
//! in a single environment so every write is one transaction.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod keys;
pub mod meta;
pub mod migration;
pub mod verification;

pub use environment::{LmdbEnvironment, DEFAULT_MAP_SIZE};
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use verification::LmdbVerificationStore;
