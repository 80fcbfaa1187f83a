//! Offset/limit pagination for record reads.

use serde::{Deserialize, Serialize};

/// Default and maximum page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationLimits {
    /// Page size used when the caller does not ask for one.
    pub default_limit: u32,
    /// Largest page size ever served.
    pub max_limit: u32,
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// Resolved page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    limit: u32,
    offset: u64,
}

impl PageRequest {
    /// Resolves caller-supplied pagination against `limits`.
    ///
    /// Missing values take the defaults (`limits.default_limit`, offset 0).
    /// Limits above `limits.max_limit` are clamped down to it and a limit of
    /// zero is raised to one.
    #[must_use]
    pub fn resolve(limit: Option<u32>, offset: Option<u64>, limits: PaginationLimits) -> Self {
        let ceiling = limits.max_limit.max(1);
        let requested = limit.unwrap_or(limits.default_limit);
        Self {
            limit: requested.clamp(1, ceiling),
            offset: offset.unwrap_or(0),
        }
    }

    /// Returns the number of rows to return at most.
    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    /// Returns the number of rows to skip.
    #[must_use]
    pub const fn offset(self) -> u64 {
        self.offset
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::resolve(None, None, PaginationLimits::default())
    }
}
