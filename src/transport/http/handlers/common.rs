use crate::domain::session::SessionContext;
use crate::error::CoreError;
use crate::transport::http::types::{ApiResponse, AppState};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

pub fn ok<T: Serialize>(status: StatusCode, data: &T) -> Response {
    match serde_json::to_value(data) {
        Ok(value) => (
            status,
            Json(ApiResponse {
                success: true,
                data: Some(value),
                error: None,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "response serialization failed");
            fail(StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
        }
    }
}

pub fn fail(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }),
    )
        .into_response()
}

pub fn status_for(err: &CoreError) -> StatusCode {
    match err {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::Authorization(_) => StatusCode::UNAUTHORIZED,
        CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::Fetch(_) => StatusCode::BAD_GATEWAY,
        CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Storage and fetch details stay in the logs.
pub fn error_response(err: CoreError) -> Response {
    let status = status_for(&err);
    let message = if err.is_public() {
        warn!(%status, error = %err, "request rejected");
        err.to_string()
    } else {
        error!(%status, error = %err, "request failed");
        match err {
            CoreError::Fetch(_) => "could not fetch the requested page".to_string(),
            _ => "internal error".to_string(),
        }
    };
    fail(status, message)
}

pub fn respond<T: Serialize>(result: Result<T, CoreError>) -> Response {
    match result {
        Ok(data) => ok(StatusCode::OK, &data),
        Err(e) => error_response(e),
    }
}

pub fn invalid_body(e: impl std::fmt::Display) -> Response {
    fail(
        StatusCode::UNPROCESSABLE_ENTITY,
        format!("Invalid JSON body: {}", e),
    )
}

/// Token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn session_for(state: &AppState, headers: &HeaderMap) -> SessionContext {
    state.sessions.resolve(bearer_token(headers)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_parsed() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn errors_map_to_statuses() {
        assert_eq!(status_for(&CoreError::validation("x")), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&CoreError::Authorization("x".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_for(&CoreError::not_found("phone", 1)), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&CoreError::Fetch("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&CoreError::Storage("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
