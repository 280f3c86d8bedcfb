use crate::middleware::{FixedWindowLimiter, RateLimit};
use actix_web::{HttpResponse, web};
use serde_json::json;

/// # Service Info Endpoint
///
/// `GET /`: liveness, version, environment and uptime. Never touches the store.
pub mod info;

/// # Health Check Endpoint
///
/// `GET /api/healthcheck`: runs a store probe on demand.
///
/// ## Response
///
/// - **200 OK**: store answered ping, write and read
/// - **500 Internal Server Error**: a probe step failed
pub mod health;

/// # User Endpoints
///
/// - `POST /api/save-user`: sanitize, validate, persist
/// - `GET /api/users`: paginated, searchable listing
pub mod users;

/// Every routable endpoint, reported back on 404.
pub const AVAILABLE_ENDPOINTS: [&str; 4] = [
    "GET /",
    "GET /api/healthcheck",
    "POST /api/save-user",
    "GET /api/users",
];

/// # API Route Configuration
///
/// ## Mounted Services
/// - Service info at `/` (see [`info::configure_routes`])
/// - Under `/api`, behind the per-client rate limit:
///   - health check (see [`health::configure_routes`])
///   - users (see [`users::configure_routes`])
/// - Anything else answers 404 with the list of known endpoints
///
/// The limiter is passed in so every worker shares the same counters.
///
/// [`info::configure_routes`]: crate::routes::info::configure_routes
/// [`health::configure_routes`]: crate::routes::health::configure_routes
/// [`users::configure_routes`]: crate::routes::users::configure_routes
pub fn configure(cfg: &mut web::ServiceConfig, limiter: FixedWindowLimiter) {
    cfg.configure(info::configure_routes).service(
        web::scope("/api")
            .wrap(RateLimit::new(limiter))
            .configure(health::configure_routes)
            .configure(users::configure_routes),
    );
}

/// Fallback for unmatched paths; register with `App::default_service`.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "success": false,
        "error": "Endpoint not found",
        "availableEndpoints": AVAILABLE_ENDPOINTS,
    }))
}
