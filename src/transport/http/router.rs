use crate::app::ScrapePreview;
use crate::domain::extract::SpecRecord;
use crate::domain::model::{
    CatalogItem, DeviceSuggestion, NewPhone, PendingReview, PhoneDetail, PublishOutcome,
    PublishedReview, ScoreUpdate, SpecSheet,
};
use crate::domain::session::{Role, SessionToken};
use crate::transport::http::handlers::{
    admin_catalog, auth, catalog, health, reviews, suggestions,
};
use crate::transport::http::types::{
    ApiResponse, AppState, LoginRequest, PhoneUploadForm, ReviewRequest, ScrapeRequest,
    SuggestionRequest,
};
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Upper bound on a phone upload (image plus form fields).
const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        catalog::list_phones_handler,
        catalog::phone_detail_handler,
        catalog::list_brands_handler,
        catalog::phones_by_brand_handler,
        catalog::search_handler,
        reviews::submit_review_handler,
        suggestions::suggest_handler,
        auth::login_handler,
        auth::logout_handler,
        reviews::list_pending_handler,
        reviews::list_rejected_handler,
        reviews::publish_handler,
        reviews::reject_handler,
        reviews::delete_handler,
        admin_catalog::scrape_handler,
        admin_catalog::create_phone_handler,
        admin_catalog::attach_specs_handler,
        suggestions::list_suggestions_handler
    ),
    components(schemas(
        ApiResponse,
        LoginRequest,
        ReviewRequest,
        SuggestionRequest,
        ScrapeRequest,
        PhoneUploadForm,
        CatalogItem,
        NewPhone,
        PhoneDetail,
        SpecSheet,
        SpecRecord,
        ScrapePreview,
        PendingReview,
        PublishedReview,
        PublishOutcome,
        ScoreUpdate,
        DeviceSuggestion,
        SessionToken,
        Role
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/phones", get(catalog::list_phones_handler))
        .route("/api/phones/:id", get(catalog::phone_detail_handler))
        .route("/api/phones/:id/reviews", post(reviews::submit_review_handler))
        .route("/api/brands", get(catalog::list_brands_handler))
        .route("/api/brands/:brand/phones", get(catalog::phones_by_brand_handler))
        .route("/api/search", get(catalog::search_handler))
        .route("/api/suggestions", post(suggestions::suggest_handler));

    let admin = Router::new()
        .route("/admin/login", post(auth::login_handler))
        .route("/admin/logout", post(auth::logout_handler))
        .route("/admin/reviews/pending", get(reviews::list_pending_handler))
        .route("/admin/reviews/rejected", get(reviews::list_rejected_handler))
        .route("/admin/reviews/:id/publish", post(reviews::publish_handler))
        .route("/admin/reviews/:id/reject", post(reviews::reject_handler))
        .route("/admin/reviews/:id", delete(reviews::delete_handler))
        .route("/admin/scrape", post(admin_catalog::scrape_handler))
        .route(
            "/admin/phones",
            post(admin_catalog::create_phone_handler)
                .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route("/admin/phones/:id/specs", put(admin_catalog::attach_specs_handler))
        .route("/admin/suggestions", get(suggestions::list_suggestions_handler));

    public.merge(admin).with_state(app_state)
}
