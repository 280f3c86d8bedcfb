use crate::config::Environment;
use crate::models::ErrorBody;
use crate::store::StoreError;
use crate::validation::ValidationErrors;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::error;

/// Every failure a handler can return.
///
/// Each variant renders as the JSON failure envelope; nothing crosses the
/// HTTP boundary as plain text.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("duplicate value for unique field `{field}`")]
    DuplicateKey { field: String, code: i32 },
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("store unavailable: {detail}")]
    Connectivity { detail: String, expose: bool },
    #[error("unhandled error: {detail}")]
    Unhandled { detail: String, expose: bool },
}

impl ApiError {
    /// Converts a store failure, exposing internals only in development.
    pub fn from_store(err: StoreError, environment: Environment) -> Self {
        let expose = environment.is_development();
        match err {
            StoreError::DuplicateKey { field, code } => ApiError::DuplicateKey { field, code },
            StoreError::Connectivity(detail) => ApiError::Connectivity { detail, expose },
            StoreError::Backend(detail) => ApiError::Unhandled { detail, expose },
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::Validation(errors) => {
                ErrorBody::new(errors.summary()).with_errors(errors.fields().clone())
            }
            ApiError::DuplicateKey { field, code } => {
                let mut errors = BTreeMap::new();
                errors.insert(field.clone(), format!("{} already exists", capitalize(field)));
                ErrorBody::new("Duplicate key error")
                    .with_errors(errors)
                    .with_code(*code)
            }
            ApiError::MalformedRequest(detail) => {
                ErrorBody::new("Malformed request").with_details(Some(detail.clone()))
            }
            ApiError::Connectivity { detail, expose } => ErrorBody::new("Database unavailable")
                .with_details(expose.then(|| detail.clone())),
            ApiError::Unhandled { detail, expose } => ErrorBody::new("Internal server error")
                .with_details(expose.then(|| detail.clone())),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::DuplicateKey { .. }
            | ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Connectivity { .. } | ApiError::Unhandled { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        HttpResponse::build(status).json(self.body())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use serde_json::Value;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_validation_error_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "Name is required");

        let (status, body) = render(ApiError::from(errors)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Validation failed for 1 field");
        assert_eq!(body["errors"]["name"], "Name is required");
        assert!(body.get("code").is_none());
    }

    #[actix_web::test]
    async fn test_duplicate_key_carries_code() {
        let err = ApiError::from_store(StoreError::duplicate_email(), Environment::Production);
        let (status, body) = render(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 11000);
        assert_eq!(body["errors"]["email"], "Email already exists");
    }

    #[actix_web::test]
    async fn test_internals_hidden_outside_development() {
        let err = ApiError::from_store(
            StoreError::Backend("cursor id 42 not found".to_string()),
            Environment::Production,
        );
        let (status, body) = render(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("details").is_none());
    }

    #[actix_web::test]
    async fn test_internals_shown_in_development() {
        let err = ApiError::from_store(
            StoreError::Connectivity("server selection timeout".to_string()),
            Environment::Development,
        );
        let (status, body) = render(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Database unavailable");
        assert_eq!(body["details"], "server selection timeout");
    }
}
