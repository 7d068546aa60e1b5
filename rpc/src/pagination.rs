//! Query parameters for the review queue endpoint.

use serde::Deserialize;

use vetting_types::{Role, VerificationStatus};
use vetting_verification::QueueQuery;

use crate::error::RpcError;

/// Raw `?page=&limit=&status=&role=` parameters. Filters arrive as text so
/// an unknown value is reported as a bad request rather than a generic
/// deserialisation failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub role: Option<String>,
}

impl ListParams {
    pub fn into_query(self) -> Result<QueueQuery, RpcError> {
        let status = non_empty(self.status)
            .map(|s| s.parse::<VerificationStatus>())
            .transpose()
            .map_err(|e| RpcError::InvalidRequest(e.to_string()))?;
        let role = non_empty(self.role)
            .map(|r| r.parse::<Role>())
            .transpose()
            .map_err(|e| RpcError::InvalidRequest(e.to_string()))?;
        Ok(QueueQuery {
            page: self.page,
            limit: self.limit,
            status,
            role,
        })
    }
}

/// `?status=` with no value means no filter.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
