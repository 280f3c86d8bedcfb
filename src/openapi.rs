use utoipa::OpenApi;

/// OpenAPI Specification Documentation
///
/// Generated at compile time from the `#[utoipa::path]` annotations on the
/// handlers and served at `/api-docs/openapi.json` with Swagger UI at
/// `/swagger-ui/`.
///
/// # Endpoints
/// - Service info: `GET /`
/// - Health Check: `GET /api/healthcheck`
/// - Save user: `POST /api/save-user`
/// - List users: `GET /api/users`
///
/// # Schemas
/// - `UserRequest`: save-user input
/// - `StoredUser`: persisted user as returned to clients
/// - `HealthReport`: probe outcome
/// - `ServiceInfo`: root liveness payload
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::info::info,
        crate::routes::health::healthcheck,
        crate::routes::users::save_user,
        crate::routes::users::list_users,
    ),
    components(
        schemas(
            crate::models::UserRequest,
            crate::models::StoredUser,
            crate::models::Category,
            crate::models::HealthReport,
            crate::models::HealthStatus,
            crate::models::StoreConnection,
            crate::models::ServiceInfo,
        )
    ),
    tags(
        (name = "Health Check", description = "Service liveness and store health"),
        (name = "Users", description = "User registration and listing")
    ),
    info(
        description = "Registration and listing of users backed by MongoDB",
        title = "User Registry API",
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/", "/api/healthcheck", "/api/save-user", "/api/users"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
