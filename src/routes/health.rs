use crate::models::HealthReport;
use crate::state::AppState;
use actix_web::{HttpResponse, Responder, get, web};

/// # Health Check Endpoint
///
/// Probes the store (ping, synthetic write, synthetic read) and reports the
/// outcome.
///
/// ## Response
///
/// - **200 OK**: every probe step succeeded
/// - **500 Internal Server Error**: a step failed; `status` is `unhealthy`
///   and `error` holds the reason
///
/// ## Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "storeConnection": "active",
///   "lastCheckTimestamp": "2023-10-05T14:23:45.678Z",
///   "totalChecksRecorded": 12,
///   "totalRecords": 3,
///   "timestamp": "2023-10-05T14:23:45.690Z"
/// }
/// ```
#[utoipa::path(
    get,
    path = "/api/healthcheck",
    responses(
        (status = 200, description = "Store is reachable and writable", body = HealthReport),
        (status = 500, description = "Store probe failed", body = HealthReport)
    ),
    tag = "Health Check"
)]
#[get("/healthcheck")]
pub async fn healthcheck(state: web::Data<AppState>) -> impl Responder {
    let report = state.monitor.probe().await;
    if report.is_healthy() {
        HttpResponse::Ok().json(report)
    } else {
        HttpResponse::InternalServerError().json(report)
    }
}

/// # Route Configuration
///
/// - `GET /healthcheck`: on-demand store probe
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(healthcheck);
}
