//! Paginated review queue for administrators.

use serde::{Deserialize, Serialize};

use vetting_store::{RequestFilter, VerificationStore};
use vetting_types::{Role, VerificationRequest, VerificationStatus};

use crate::error::VerificationError;
use crate::review::ReviewEngine;

/// Default page size when `limit` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page-size bounds, configurable per deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_SIZE,
            max_limit: MAX_PAGE_SIZE,
        }
    }
}

/// Listing parameters. Absent filters match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<VerificationStatus>,
    /// Matches the role recorded on the request at submission time, not the
    /// submitter's current role.
    pub role: Option<Role>,
}

impl QueueQuery {
    /// 1-based page; `0` is treated as the first page.
    pub fn effective_page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Resolve effective page size, clamped to `[1, max_limit]`.
    pub fn effective_limit(&self, limits: &PageLimits) -> u32 {
        let max = limits.max_limit.max(1);
        self.limit.unwrap_or(limits.default_limit).clamp(1, max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub total: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total_pages: total.div_ceil(u64::from(limit.max(1))),
            total,
        }
    }

    /// Offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Read-only listing over all requests, newest submission first with ties
/// broken by the higher request id.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReviewQueue {
    limits: PageLimits,
    gate: ReviewEngine,
}

impl ReviewQueue {
    pub fn new(limits: PageLimits) -> Self {
        Self {
            limits,
            gate: ReviewEngine::new(),
        }
    }

    pub fn limits(&self) -> &PageLimits {
        &self.limits
    }

    /// List one page. Only reviewers may call this.
    pub fn list<S>(
        &self,
        store: &S,
        caller_role: Role,
        query: &QueueQuery,
    ) -> Result<Page<VerificationRequest>, VerificationError>
    where
        S: VerificationStore + ?Sized,
    {
        self.gate.authorize(caller_role)?;

        let page = query.effective_page();
        let limit = query.effective_limit(&self.limits);
        let filter = RequestFilter {
            status: query.status,
            role: query.role,
        };
        let offset = Pagination::new(page, limit, 0).offset();
        let window = store.list_page(&filter, offset, limit as usize)?;

        Ok(Page {
            items: window.items,
            pagination: Pagination::new(page, limit, window.total),
        })
    }
}
