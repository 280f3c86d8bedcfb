use super::user::StoredUser;
use serde::Serialize;
use std::collections::BTreeMap;

/// `{ "success": true, "data": ... }` returned for a created resource.
#[derive(Debug, Serialize)]
pub struct Created<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Created<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Paginated listing envelope for `GET /api/users`.
#[derive(Debug, Serialize)]
pub struct UserList {
    pub success: bool,
    /// Number of items on this page.
    pub count: usize,
    /// Number of items matching the query across all pages.
    pub total: u64,
    pub pages: u64,
    pub data: Vec<StoredUser>,
}

impl UserList {
    pub fn new(data: Vec<StoredUser>, total: u64, page_size: u64) -> Self {
        Self {
            success: true,
            count: data.len(),
            total,
            pages: total.div_ceil(page_size.max(1)),
            data,
        }
    }
}

/// Failure envelope shared by every non-2xx JSON response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            errors: BTreeMap::new(),
            code: None,
            details: None,
        }
    }

    pub fn with_errors(mut self, errors: BTreeMap<String, String>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }
}
