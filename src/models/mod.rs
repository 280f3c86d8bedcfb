/// # Health Models
///
/// Probe report returned by `GET /api/healthcheck`, the event appended to the
/// health-check log on every probe, and the service info served at `/`.
pub mod health;

/// JSON envelopes shared by the REST handlers (`success`, `error`, `errors`).
pub mod response;

/// # User Models
///
/// The persisted user record, its validated pre-insert form, and the fixed
/// category enumeration.
pub mod user;

pub use health::{HealthCheckEvent, HealthReport, HealthStatus, ServiceInfo, StoreConnection};
pub use response::{Created, ErrorBody, UserList};
pub use user::{Category, NewUser, StoredUser, UserRequest};
