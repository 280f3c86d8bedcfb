use super::{sanitize_map, sanitize_value};
use crate::error::ApiError;
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use futures::future::LocalBoxFuture;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::{Ready, ready};

/// JSON request body, sanitized before the handler runs.
///
/// Malformed JSON is rejected with a 400 envelope instead of actix's plain-text
/// error.
#[derive(Debug)]
pub struct SanitizedJson(pub Value);

impl SanitizedJson {
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl FromRequest for SanitizedJson {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let body = web::Json::<Value>::from_request(req, payload);

        Box::pin(async move {
            let mut value = body
                .await
                .map_err(|e| ApiError::MalformedRequest(e.to_string()))?
                .into_inner();
            sanitize_value(&mut value);
            Ok(SanitizedJson(value))
        })
    }
}

/// Query string parameters, sanitized before the handler runs.
#[derive(Debug, Default)]
pub struct SanitizedQuery(pub Map<String, Value>);

impl SanitizedQuery {
    /// Returns a parameter as text, if it survived sanitization.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

impl FromRequest for SanitizedQuery {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let parsed = web::Query::<HashMap<String, String>>::from_query(req.query_string())
            .map_err(|e| ApiError::MalformedRequest(e.to_string()))
            .map(|query| {
                let mut map: Map<String, Value> = query
                    .into_inner()
                    .into_iter()
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect();
                sanitize_map(&mut map);
                SanitizedQuery(map)
            });

        ready(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_json_body_is_sanitized() {
        let (req, mut payload) = TestRequest::post()
            .set_json(serde_json::json!({ "name": "<b>Ada</b>", "$where": "1" }))
            .to_http_parts();

        let SanitizedJson(value) = SanitizedJson::from_request(&req, &mut payload)
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!({ "name": "&lt;b&gt;Ada&lt;/b&gt;" }));
    }

    #[actix_web::test]
    async fn test_malformed_json_is_rejected() {
        let (req, mut payload) = TestRequest::post()
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_http_parts();

        let result = SanitizedJson::from_request(&req, &mut payload).await;
        assert!(matches!(result, Err(ApiError::MalformedRequest(_))));
    }

    #[actix_web::test]
    async fn test_query_operator_keys_dropped() {
        let (req, mut payload) = TestRequest::get()
            .uri("/users?page=2&%24where=1&search=%3Cscript%3Ex%3C%2Fscript%3Eada")
            .to_http_parts();

        let query = SanitizedQuery::from_request(&req, &mut payload).await.unwrap();

        assert_eq!(query.get("page"), Some("2"));
        assert_eq!(query.get("search"), Some("ada"));
        assert!(query.get("$where").is_none());
    }
}
