//! Review submission and moderation.

use crate::domain::model::NewReview;
use crate::transport::http::handlers::common::{
    error_response, invalid_body, ok, respond, session_for,
};
use crate::transport::http::types::{AppState, PageQuery, ReviewRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/phones/{id}/reviews",
    params(
        ("id" = i64, Path, description = "Phone identifier")
    ),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review queued for moderation", body = crate::transport::http::types::ApiResponse),
        (status = 400, description = "Invalid review", body = crate::transport::http::types::ApiResponse),
        (status = 404, description = "Unknown phone", body = crate::transport::http::types::ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = crate::transport::http::types::ApiResponse)
    )
)]
pub async fn submit_review_handler(
    State(state): State<AppState>,
    Path(phone_id): Path<i64>,
    request: Result<Json<ReviewRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return invalid_body(e),
    };
    let review = NewReview {
        author: request.author,
        score: request.score,
        body: request.body,
        phone_id,
    };
    match state.moderation.submit_review(review).await {
        Ok(pending) => ok(StatusCode::CREATED, &pending),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/admin/reviews/pending",
    params(PageQuery),
    responses(
        (status = 200, description = "Unmoderated reviews in submission order", body = crate::transport::http::types::ApiResponse),
        (status = 401, description = "Admin session required", body = crate::transport::http::types::ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_pending_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let ctx = session_for(&state, &headers).await;
    let size = state.moderation.page_size();
    respond(
        state
            .moderation
            .list_pending(&ctx, query.page(size, size))
            .await,
    )
}

#[utoipa::path(
    get,
    path = "/admin/reviews/rejected",
    params(PageQuery),
    responses(
        (status = 200, description = "Rejected reviews kept for audit", body = crate::transport::http::types::ApiResponse),
        (status = 401, description = "Admin session required", body = crate::transport::http::types::ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_rejected_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let ctx = session_for(&state, &headers).await;
    let size = state.moderation.page_size();
    respond(
        state
            .moderation
            .list_rejected(&ctx, query.page(size, size))
            .await,
    )
}

#[utoipa::path(
    post,
    path = "/admin/reviews/{id}/publish",
    params(
        ("id" = i64, Path, description = "Pending review identifier")
    ),
    responses(
        (status = 200, description = "Published, or already published (no-op)", body = crate::transport::http::types::ApiResponse),
        (status = 400, description = "Review was rejected", body = crate::transport::http::types::ApiResponse),
        (status = 401, description = "Admin session required", body = crate::transport::http::types::ApiResponse),
        (status = 404, description = "Unknown review", body = crate::transport::http::types::ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn publish_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let ctx = session_for(&state, &headers).await;
    respond(state.moderation.publish(&ctx, id).await)
}

#[utoipa::path(
    post,
    path = "/admin/reviews/{id}/reject",
    params(
        ("id" = i64, Path, description = "Pending review identifier")
    ),
    responses(
        (status = 200, description = "Review rejected", body = crate::transport::http::types::ApiResponse),
        (status = 401, description = "Admin session required", body = crate::transport::http::types::ApiResponse),
        (status = 404, description = "Unknown review", body = crate::transport::http::types::ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn reject_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let ctx = session_for(&state, &headers).await;
    respond(
        state
            .moderation
            .reject(&ctx, id)
            .await
            .map(|()| serde_json::json!({ "review_id": id, "state": "rejected" })),
    )
}

#[utoipa::path(
    delete,
    path = "/admin/reviews/{id}",
    params(
        ("id" = i64, Path, description = "Pending review identifier")
    ),
    responses(
        (status = 200, description = "Review deleted", body = crate::transport::http::types::ApiResponse),
        (status = 401, description = "Admin session required", body = crate::transport::http::types::ApiResponse),
        (status = 404, description = "Unknown review", body = crate::transport::http::types::ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let ctx = session_for(&state, &headers).await;
    respond(
        state
            .moderation
            .delete(&ctx, id)
            .await
            .map(|()| serde_json::json!({ "review_id": id, "state": "deleted" })),
    )
}
