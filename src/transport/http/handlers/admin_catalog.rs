//! Admin catalog writes: scrape preview, phone upload, spec sheet attach.

use crate::app::ImageUpload;
use crate::domain::model::{NewPhone, SpecSheet};
use crate::domain::session::Role;
use crate::error::CoreError;
use crate::transport::http::handlers::common::{
    error_response, invalid_body, ok, respond, session_for,
};
use crate::transport::http::types::{AppState, ScrapeRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/admin/scrape",
    request_body = ScrapeRequest,
    responses(
        (status = 200, description = "Extracted record with missing fields and duplicate hint", body = crate::transport::http::types::ApiResponse),
        (status = 400, description = "Invalid URL", body = crate::transport::http::types::ApiResponse),
        (status = 401, description = "Admin session required", body = crate::transport::http::types::ApiResponse),
        (status = 502, description = "Spec page could not be fetched", body = crate::transport::http::types::ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn scrape_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Result<Json<ScrapeRequest>, JsonRejection>,
) -> impl IntoResponse {
    let ctx = session_for(&state, &headers).await;
    if let Err(e) = ctx.require(Role::Admin) {
        return error_response(e);
    }
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return invalid_body(e),
    };
    respond(state.scraper.preview(&ctx, &request.url).await)
}

/// Fields collected from the multipart upload.
#[derive(Default)]
struct PhoneForm {
    fields: NewPhone,
    specs: Option<SpecSheet>,
    image: Option<ImageUpload>,
}

async fn read_phone_form(mut multipart: Multipart) -> Result<PhoneForm, CoreError> {
    let mut form = PhoneForm::default();
    let bad = |e: axum::extract::multipart::MultipartError| {
        CoreError::validation(format!("malformed multipart body: {}", e))
    };

    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(bad)?;
                form.image = Some(ImageUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            "model_name" => form.fields.model_name = field.text().await.map_err(bad)?,
            "brand" => form.fields.brand = field.text().await.map_err(bad)?,
            "release_date" => form.fields.release_date = Some(field.text().await.map_err(bad)?),
            "specs" => {
                let raw = field.text().await.map_err(bad)?;
                if !raw.trim().is_empty() {
                    let specs = serde_json::from_str::<SpecSheet>(&raw)
                        .map_err(|e| CoreError::validation(format!("invalid specs JSON: {}", e)))?;
                    form.specs = Some(specs);
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

#[utoipa::path(
    post,
    path = "/admin/phones",
    request_body(content = crate::transport::http::types::PhoneUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Phone added", body = crate::transport::http::types::ApiResponse),
        (status = 400, description = "Missing image or fields", body = crate::transport::http::types::ApiResponse),
        (status = 401, description = "Admin session required", body = crate::transport::http::types::ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_phone_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> impl IntoResponse {
    let ctx = session_for(&state, &headers).await;
    // Reject before reading a potentially large body.
    if let Err(e) = ctx.require(Role::Admin) {
        return error_response(e);
    }
    let form = match read_phone_form(multipart).await {
        Ok(f) => f,
        Err(e) => return error_response(e),
    };

    let result = match form.specs {
        Some(specs) => {
            state
                .catalog
                .create_phone_with_specs(&ctx, &form.fields, form.image, specs)
                .await
        }
        None => state.catalog.create_phone(&ctx, &form.fields, form.image).await,
    };
    match result {
        Ok(item) => ok(StatusCode::CREATED, &item),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    put,
    path = "/admin/phones/{id}/specs",
    params(
        ("id" = i64, Path, description = "Phone identifier")
    ),
    request_body = SpecSheet,
    responses(
        (status = 200, description = "Spec sheet stored", body = crate::transport::http::types::ApiResponse),
        (status = 401, description = "Admin session required", body = crate::transport::http::types::ApiResponse),
        (status = 404, description = "Unknown phone", body = crate::transport::http::types::ApiResponse)
    ),
    security(("bearer" = []))
)]
pub async fn attach_specs_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    request: Result<Json<SpecSheet>, JsonRejection>,
) -> impl IntoResponse {
    let ctx = session_for(&state, &headers).await;
    if let Err(e) = ctx.require(Role::Admin) {
        return error_response(e);
    }
    let Json(specs) = match request {
        Ok(v) => v,
        Err(e) => return invalid_body(e),
    };
    respond(
        state
            .catalog
            .attach_specs(&ctx, id, specs)
            .await
            .map(|()| serde_json::json!({ "phone_id": id })),
    )
}
