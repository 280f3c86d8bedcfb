//! # Record Store
//!
//! [`RecordStore`] is the only way handlers and the health monitor touch
//! persistent state. [`MongoStore`] is the production implementation;
//! [`MemoryStore`] is an in-process fake with the same contract.

use crate::models::{HealthCheckEvent, NewUser, StoredUser};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// MongoDB's duplicate key error code, reused by every implementation.
pub const DUPLICATE_KEY_CODE: i32 = 11000;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("duplicate value for unique field `{field}`")]
    DuplicateKey { field: String, code: i32 },
    #[error("store unreachable: {0}")]
    Connectivity(String),
    #[error("store operation failed: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn duplicate_email() -> Self {
        StoreError::DuplicateKey {
            field: "email".to_string(),
            code: DUPLICATE_KEY_CODE,
        }
    }
}

/// Runs one store call, failing with [`StoreError::Connectivity`] if it has
/// not finished within `timeout`.
pub async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(timeout, call).await.unwrap_or_else(|_| {
        Err(StoreError::Connectivity(format!(
            "store call timed out after {} ms",
            timeout.as_millis()
        )))
    })
}

/// 1-based offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Normalizes raw query parameters.
    ///
    /// Missing, non-numeric, zero or negative values fall back to the
    /// defaults; page size is capped at [`MAX_PAGE_SIZE`].
    pub fn from_params(page: Option<&str>, page_size: Option<&str>) -> Self {
        let positive = |raw: Option<&str>| {
            raw.and_then(|s| s.trim().parse::<i64>().ok())
                .filter(|n| *n > 0)
                .map(|n| n as u64)
        };

        Self::new(
            positive(page).unwrap_or(DEFAULT_PAGE),
            positive(page_size).unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }

    /// Records before the requested page. Capped at `i64::MAX`, the largest
    /// skip BSON can carry; past the end it simply yields an empty page.
    pub fn skip(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.page_size)
            .min(i64::MAX as u64)
    }

    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub pagination: Pagination,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn new(pagination: Pagination, search: Option<String>) -> Self {
        let search = search
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty());
        Self { pagination, search }
    }
}

/// One page of users plus the size of the whole matching set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPage {
    pub items: Vec<StoredUser>,
    pub total: u64,
}

/// Persistence contract for users and the health-check log.
///
/// Implementations must be safe to share across actix workers and the health
/// scheduler.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persists one user. Fails with [`StoreError::DuplicateKey`] when the
    /// email is taken; nothing is written on failure.
    async fn create(&self, user: NewUser) -> Result<StoredUser, StoreError>;

    /// Returns users newest first, optionally filtered by a text search over
    /// name and email.
    async fn list(&self, query: &ListQuery) -> Result<UserPage, StoreError>;

    async fn count_all(&self) -> Result<u64, StoreError>;

    /// Cheap reachability check.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn record_health_check(&self, event: HealthCheckEvent) -> Result<(), StoreError>;

    async fn latest_health_check(&self) -> Result<Option<HealthCheckEvent>, StoreError>;

    async fn count_health_checks(&self) -> Result<u64, StoreError>;
}
