use actix_web::middleware::{Compress, Logger};
use actix_web::{App, HttpServer, web};
use std::process;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use user_registry::config::AppConfig;
use user_registry::middleware::{FixedWindowLimiter, security_headers};
use user_registry::monitor::{HealthMonitor, spawn_scheduler};
use user_registry::openapi::ApiDoc;
use user_registry::routes;
use user_registry::state::AppState;
use user_registry::store::{MongoStore, RecordStore};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// User Registry Service Entry Point
///
/// Configures and launches the Actix-web HTTP server with:
/// - MongoDB-backed user store, connected and indexed before binding
/// - Scheduled store health probes
/// - Security headers, compression and request logging on every response
/// - Per-client rate limiting under `/api`
/// - Swagger UI for API documentation
///
/// # Endpoints
/// - Info: `/`
/// - API: `/api/healthcheck`, `/api/save-user`, `/api/users`
/// - Swagger UI: `/swagger-ui/`
/// - OpenAPI spec: `/api-docs/openapi.json`
///
/// # Configuration
/// - Environment variables, optionally from a `.env` file (see [`AppConfig`])
/// - Log filter from `RUST_LOG`
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("user_registry=info,actix_web=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            process::exit(1);
        }
    };

    let store: Arc<dyn RecordStore> = match MongoStore::connect(&config.store).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(error = %e, "store unreachable at startup");
            process::exit(1);
        }
    };
    info!(database = %config.store.database, "connected to store");

    let monitor = Arc::new(HealthMonitor::new(
        store.clone(),
        config.health.probe_timeout,
    ));
    let scheduler = spawn_scheduler(monitor.clone(), config.health.interval);

    let state = web::Data::new(
        AppState::new(store, monitor, config.environment)
            .with_store_timeout(config.store.timeout),
    );
    let limiter = FixedWindowLimiter::new(config.rate_limit.clone());
    let openapi = ApiDoc::openapi();

    info!(
        host = %config.host,
        port = config.port,
        environment = %config.environment,
        "starting server"
    );

    let result = HttpServer::new(move || {
        let limiter = limiter.clone();

        App::new()
            .wrap(Logger::default())
            .wrap(Compress::default())
            .wrap(security_headers())
            .app_data(state.clone())
            .configure(move |cfg| routes::configure(cfg, limiter))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            .default_service(web::route().to(routes::not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    scheduler.abort();
    info!("server stopped");
    result
}
