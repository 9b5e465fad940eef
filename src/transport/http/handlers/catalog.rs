//! Public catalog reads.

use crate::transport::http::handlers::common::{fail, respond};
use crate::transport::http::types::{
    AppState, PageQuery, SearchQuery, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/api/phones",
    params(PageQuery),
    responses(
        (status = 200, description = "Phones, newest first", body = crate::transport::http::types::ApiResponse),
        (status = 500, description = "Internal server error", body = crate::transport::http::types::ApiResponse)
    )
)]
pub async fn list_phones_handler(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let page = query.page(DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    respond(state.catalog.list_phones(page).await)
}

#[utoipa::path(
    get,
    path = "/api/phones/{id}",
    params(
        ("id" = i64, Path, description = "Phone identifier")
    ),
    responses(
        (status = 200, description = "Phone with spec sheet and latest published reviews", body = crate::transport::http::types::ApiResponse),
        (status = 404, description = "Unknown phone", body = crate::transport::http::types::ApiResponse)
    )
)]
pub async fn phone_detail_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    respond(state.catalog.phone_detail(id).await)
}

#[utoipa::path(
    get,
    path = "/api/brands",
    responses(
        (status = 200, description = "Distinct brands, sorted", body = crate::transport::http::types::ApiResponse)
    )
)]
pub async fn list_brands_handler(State(state): State<AppState>) -> impl IntoResponse {
    respond(state.catalog.list_brands().await)
}

#[utoipa::path(
    get,
    path = "/api/brands/{brand}/phones",
    params(
        ("brand" = String, Path, description = "Brand name (case-insensitive)"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Phones of the brand, newest first", body = crate::transport::http::types::ApiResponse)
    )
)]
pub async fn phones_by_brand_handler(
    State(state): State<AppState>,
    Path(brand): Path<String>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let page = query.page(DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    respond(state.catalog.phones_by_brand(&brand, page).await)
}

#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching phones, newest first", body = crate::transport::http::types::ApiResponse),
        (status = 400, description = "Missing query", body = crate::transport::http::types::ApiResponse)
    )
)]
pub async fn search_handler(
    State(state): State<AppState>,
    query: Option<Query<SearchQuery>>,
) -> impl IntoResponse {
    let Some(Query(query)) = query else {
        return fail(
            StatusCode::BAD_REQUEST,
            "query parameter 'q' is required".to_string(),
        );
    };
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT);
    respond(state.catalog.search_phones(&query.q, limit).await)
}
