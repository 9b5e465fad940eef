use crate::transport::http::handlers::common::{
    bearer_token, error_response, invalid_body, ok, session_for,
};
use crate::domain::session::Role;
use crate::transport::http::types::{AppState, LoginRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened; use the token as a Bearer credential", body = crate::transport::http::types::ApiResponse),
        (status = 401, description = "Wrong password", body = crate::transport::http::types::ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = crate::transport::http::types::ApiResponse)
    )
)]
pub async fn login_handler(
    State(state): State<AppState>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return invalid_body(e),
    };
    match state.sessions.login(&request.password).await {
        Ok(token) => ok(StatusCode::OK, &token),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/admin/logout",
    responses(
        (status = 200, description = "Session closed", body = crate::transport::http::types::ApiResponse),
        (status = 401, description = "Admin session required", body = crate::transport::http::types::ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let ctx = session_for(&state, &headers).await;
    if let Err(e) = ctx.require(Role::Admin) {
        return error_response(e);
    }
    if let Some(token) = bearer_token(&headers) {
        state.sessions.logout(token).await;
    }
    ok(StatusCode::OK, &serde_json::json!({ "logged_out": true }))
}
