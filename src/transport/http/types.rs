use crate::app::{CatalogService, ModerationService, ScrapeService};
use crate::domain::extract::Extractor;
use crate::domain::session::SessionManager;
use crate::infra::config::AppConfig;
use crate::infra::http_fetch::PageFetcher;
use crate::infra::image_store::ImageStore;
use crate::storage::{CatalogStore, Page};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

/// Default and maximum listing sizes for public endpoints.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub catalog: Arc<CatalogService>,
    pub moderation: Arc<ModerationService>,
    pub scraper: Arc<ScrapeService>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    /// Wires the services around explicitly constructed infrastructure handles.
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn CatalogStore>,
        images: Arc<dyn ImageStore>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(
            store.clone(),
            images,
            config.duplicate_match,
        ));
        let moderation = Arc::new(ModerationService::new(
            store.clone(),
            config.pending_page_size,
        ));
        let scraper = Arc::new(ScrapeService::new(Extractor::new(fetcher), catalog.clone()));
        let sessions = Arc::new(SessionManager::new(
            &config.admin_password,
            config.session_ttl,
        ));
        Self {
            store,
            catalog,
            moderation,
            scraper,
            sessions,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Number of items to return.
    pub limit: Option<u32>,
    /// Number of items to skip.
    pub offset: Option<u32>,
}

impl PageQuery {
    pub fn page(&self, default_limit: u32, max_limit: u32) -> Page {
        Page::new(
            self.limit.unwrap_or(default_limit).min(max_limit),
            self.offset.unwrap_or(0),
        )
    }
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Substring matched against model name and brand.
    pub q: String,
    pub limit: Option<u32>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ReviewRequest {
    pub author: String,
    /// 1 to 5.
    pub score: i32,
    pub body: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SuggestionRequest {
    pub model_name: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ScrapeRequest {
    /// Absolute http(s) address of a phone spec page.
    pub url: String,
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

/// Multipart form accepted by `POST /admin/phones`.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct PhoneUploadForm {
    pub model_name: String,
    pub brand: String,
    pub release_date: Option<String>,
    /// Optional spec sheet as a JSON object.
    pub specs: Option<String>,
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}
