use crate::error::ApiError;
use crate::models::{Created, UserList, UserRequest};
use crate::sanitize::{SanitizedJson, SanitizedQuery};
use crate::state::AppState;
use crate::store::{ListQuery, Pagination, with_timeout};
use crate::validation::validate_user;
use actix_web::{HttpResponse, get, post, web};
use chrono::Utc;
use tracing::{debug, info};

/// # Save User Endpoint
///
/// Validates and persists one user.
///
/// ## Request
/// - Method: POST
/// - Body: JSON object with `name`, `email`, and optional `age` / `category`
///
/// ## Responses
/// - **201 Created**: `{ "success": true, "data": { ...stored user } }`
/// - **400 Bad Request**:
///   - one or more fields invalid (`errors` maps field → reason)
///   - email already registered (`code: 11000`)
///   - body is not valid JSON
/// - **500 Internal Server Error**: store unavailable or too slow
///
/// ## Example Request
/// ```json
/// { "name": "Ada", "email": "ada@example.com", "age": 36, "category": "professional" }
/// ```
#[utoipa::path(
    post,
    path = "/api/save-user",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User saved"),
        (status = 400, description = "Invalid or duplicate user"),
        (status = 500, description = "Store unavailable")
    ),
    tag = "Users"
)]
#[post("/save-user")]
pub async fn save_user(
    state: web::Data<AppState>,
    body: SanitizedJson,
) -> Result<HttpResponse, ApiError> {
    let user = validate_user(&body.into_inner(), Utc::now())?;
    let stored = with_timeout(state.store_timeout, state.store.create(user))
        .await
        .map_err(|e| ApiError::from_store(e, state.environment))?;

    info!(user_id = %stored.id, "user saved");
    Ok(HttpResponse::Created().json(Created::new(stored)))
}

/// # List Users Endpoint
///
/// Returns users newest first, one page at a time.
///
/// ## Query Parameters
/// - `page` (default 1)
/// - `limit` (default 10, at most 100)
/// - `search` (optional): text search over name and email
///
/// Invalid `page` / `limit` values fall back to the defaults.
///
/// ## Example Response
/// ```json
/// { "success": true, "count": 1, "total": 1, "pages": 1, "data": [ { "_id": "...", "name": "Ada" } ] }
/// ```
#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Page size"),
        ("search" = Option<String>, Query, description = "Text search over name and email")
    ),
    responses(
        (status = 200, description = "One page of users"),
        (status = 500, description = "Store unavailable")
    ),
    tag = "Users"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<AppState>,
    query: SanitizedQuery,
) -> Result<HttpResponse, ApiError> {
    let pagination = Pagination::from_params(query.get("page"), query.get("limit"));
    let list_query = ListQuery::new(pagination, query.get("search").map(str::to_string));
    debug!(?list_query, "listing users");

    let page = with_timeout(state.store_timeout, state.store.list(&list_query))
        .await
        .map_err(|e| ApiError::from_store(e, state.environment))?;

    Ok(HttpResponse::Ok().json(UserList::new(page.items, page.total, pagination.page_size)))
}

/// Registers `POST /save-user` and `GET /users`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(save_user).service(list_users);
}
