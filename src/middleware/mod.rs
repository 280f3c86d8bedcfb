/// Fixed-window, per-client rate limiting for the `/api` scope.
pub mod rate_limit;

/// Hardening response headers.
pub mod security;

pub use rate_limit::{FixedWindowLimiter, RateLimit};
pub use security::security_headers;
