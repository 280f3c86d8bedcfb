use crate::models::ServiceInfo;
use crate::state::AppState;
use actix_web::{HttpResponse, Responder, get, web};

/// # Service Info Endpoint
///
/// Liveness check that never touches the store.
///
/// ## Example Response
///
/// ```json
/// {
///   "status": "running",
///   "version": "0.5.0",
///   "environment": "production",
///   "uptime": 3600
/// }
/// ```
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is running", body = ServiceInfo)
    ),
    tag = "Health Check"
)]
#[get("/")]
pub async fn info(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(ServiceInfo {
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.environment.to_string(),
        uptime: state.uptime().as_secs(),
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(info);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::monitor::HealthMonitor;
    use crate::store::MemoryStore;
    use actix_web::{App, test};
    use std::sync::Arc;
    use std::time::Duration;

    #[actix_web::test]
    async fn test_info_endpoint() {
        let store = Arc::new(MemoryStore::new());
        let monitor = Arc::new(HealthMonitor::new(store.clone(), Duration::from_secs(1)));
        let state = AppState::new(store, monitor, Environment::Test);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert!(resp.status().is_success());

        let body: ServiceInfo = test::read_body_json(resp).await;
        assert_eq!(body.status, "running");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(body.environment, "test");
    }
}
