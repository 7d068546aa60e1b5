use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("no entry for key {0}")]
    NotFound(String),

    #[error("bincode: {0}")]
    Serialization(String),

    #[error("invalid update: {0}")]
    InvalidUpdate(String),

    #[error("corrupt record: {0}")]
    Corruption(String),

    #[error("{what} is {len} bytes, keys allow at most {max}")]
    KeyTooLong {
        what: &'static str,
        len: usize,
        max: usize,
    },

    #[error("schema version {found} was written by a newer build (supported: {supported})")]
    SchemaTooNew { found: u32, supported: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for vetting_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::NotFound(key) => vetting_store::StoreError::NotFound(key),
            LmdbError::Serialization(msg) => vetting_store::StoreError::Serialization(msg),
            LmdbError::Corruption(msg) => vetting_store::StoreError::Corruption(msg),
            other => vetting_store::StoreError::Backend(other.to_string()),
        }
    }
}
