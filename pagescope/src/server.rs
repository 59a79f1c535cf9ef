// HTTP API: GET /health-check and POST /scraper

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use pagescope_core::{AnalysisError, PageAnalyzer};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use url::Url;

pub const HEALTH_MESSAGE: &str = "API is up and running";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<PageAnalyzer>,
}

pub fn build_app(analyzer: Arc<PageAnalyzer>) -> Router {
    Router::new()
        .route("/health-check", get(health_check))
        .route("/scraper", post(scrape))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { analyzer })
}

/// Rejections of a scrape request, each with a fixed wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    EmptyBody,
    MissingUrl,
    InvalidUrl,
    Unreachable,
    Internal(String),
}

impl ApiError {
    fn body(&self) -> Value {
        match self {
            ApiError::EmptyBody => error_body(400, "Request body is empty"),
            ApiError::MissingUrl => validation_body("This field is required"),
            ApiError::InvalidUrl => validation_body("Not a valid URL"),
            ApiError::Unreachable => error_body(400, "URL is not reachable"),
            ApiError::Internal(message) => error_body(500, message),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_response(self.status(), self.body().to_string())
    }
}

fn error_body(code: u16, message: &str) -> Value {
    json!({ "errors": { "code": code, "message": message } })
}

fn validation_body(message: &str) -> Value {
    json!({ "validation_errors": { "Url": [message] } })
}

fn json_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn health_check() -> &'static str {
    HEALTH_MESSAGE
}

async fn scrape(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let page_url = validate_request(&body)?;

    let result = state
        .analyzer
        .analyze_url(&page_url)
        .await
        .map_err(|e| match e {
            AnalysisError::Unreachable(source) => {
                info!("Rejecting {}: {}", page_url, source);
                ApiError::Unreachable
            }
            other => {
                warn!("Analysis of {} failed: {}", page_url, other);
                ApiError::Internal(other.to_string())
            }
        })?;

    let body = serde_json::to_string(&result).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(json_response(StatusCode::OK, body))
}

/// Pull the page URL out of a request body.
///
/// The field name is matched case-insensitively, so `url` and `Url` both work.
pub fn validate_request(body: &[u8]) -> Result<String, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| ApiError::EmptyBody)?;
    let object = value.as_object().ok_or(ApiError::EmptyBody)?;

    let page_url = match object.iter().find(|(key, _)| key.eq_ignore_ascii_case("url")) {
        None | Some((_, Value::Null)) => String::new(),
        Some((_, Value::String(url))) => url.clone(),
        Some(_) => return Err(ApiError::EmptyBody),
    };

    if page_url.is_empty() {
        return Err(ApiError::MissingUrl);
    }

    Url::parse(&page_url).map_err(|_| ApiError::InvalidUrl)?;
    Ok(page_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_lowercase_field() {
        let url = validate_request(br#"{"url": "https://example.com/"}"#).unwrap();
        assert_eq!(url, "https://example.com/");
    }

    #[test]
    fn test_validate_capitalized_field() {
        let url = validate_request(br#"{"Url": "https://example.com/"}"#).unwrap();
        assert_eq!(url, "https://example.com/");
    }

    #[test]
    fn test_validate_empty_body() {
        assert_eq!(validate_request(b""), Err(ApiError::EmptyBody));
        assert_eq!(validate_request(b"not json"), Err(ApiError::EmptyBody));
        assert_eq!(validate_request(b"[]"), Err(ApiError::EmptyBody));
    }

    #[test]
    fn test_validate_non_string_url() {
        assert_eq!(validate_request(br#"{"url": 42}"#), Err(ApiError::EmptyBody));
    }

    #[test]
    fn test_validate_missing_url() {
        assert_eq!(validate_request(b"{}"), Err(ApiError::MissingUrl));
        assert_eq!(validate_request(br#"{"url": ""}"#), Err(ApiError::MissingUrl));
        assert_eq!(validate_request(br#"{"url": null}"#), Err(ApiError::MissingUrl));
    }

    #[test]
    fn test_validate_relative_url() {
        assert_eq!(
            validate_request(br#"{"url": "example.com"}"#),
            Err(ApiError::InvalidUrl)
        );
    }

    #[test]
    fn test_error_bodies() {
        assert_eq!(
            ApiError::MissingUrl.body().to_string(),
            r#"{"validation_errors":{"Url":["This field is required"]}}"#
        );
        assert_eq!(
            ApiError::Unreachable.body().to_string(),
            r#"{"errors":{"code":400,"message":"URL is not reachable"}}"#
        );
        assert_eq!(ApiError::EmptyBody.status(), StatusCode::BAD_REQUEST);
    }
}
