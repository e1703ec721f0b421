//! Limit/offset query parameters shared by list endpoints.

use serde::Deserialize;
use utoipa::IntoParams;

/// Default page size for list queries.
pub fn default_limit() -> i64 {
    50
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    /// Maximum number of items to return (default: 50)
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Number of items to skip (default: 0)
    #[serde(default)]
    pub offset: i64,
}

impl PaginationQuery {
    /// Limits `limit` to [1, max_limit] and `offset` to >= 0.
    pub fn clamp(&self, max_limit: i64) -> (i64, i64) {
        (self.limit.clamp(1, max_limit), self.offset.max(0))
    }
}
