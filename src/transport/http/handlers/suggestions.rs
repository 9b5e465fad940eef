use crate::transport::http::handlers::common::{
    error_response, invalid_body, ok, respond, session_for,
};
use crate::transport::http::types::{
    AppState, LimitQuery, SuggestionRequest, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/suggestions",
    request_body = SuggestionRequest,
    responses(
        (status = 201, description = "Suggestion recorded", body = crate::transport::http::types::ApiResponse),
        (status = 400, description = "Empty or overlong name", body = crate::transport::http::types::ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = crate::transport::http::types::ApiResponse)
    )
)]
pub async fn suggest_handler(
    State(state): State<AppState>,
    request: Result<Json<SuggestionRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return invalid_body(e),
    };
    match state.catalog.suggest_device(&request.model_name).await {
        Ok(s) => ok(StatusCode::CREATED, &s),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/admin/suggestions",
    params(LimitQuery),
    responses(
        (status = 200, description = "Suggestions, newest first", body = crate::transport::http::types::ApiResponse),
        (status = 401, description = "Admin session required", body = crate::transport::http::types::ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_suggestions_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LimitQuery>,
) -> impl IntoResponse {
    let ctx = session_for(&state, &headers).await;
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT);
    respond(state.catalog.list_suggestions(&ctx, limit).await)
}
