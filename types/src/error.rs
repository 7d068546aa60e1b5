//! Parse errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),

    #[error("unknown role: {0}")]
    InvalidRole(String),

    #[error("unknown document slot: {0}")]
    InvalidSlot(String),

    #[error("unknown verification status: {0}")]
    InvalidStatus(String),
}
