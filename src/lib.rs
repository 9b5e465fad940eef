pub mod app;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{CatalogService, ImageUpload, ModerationService, ScrapePreview, ScrapeService};
pub use domain::extract::{parse_spec_page, Extractor, SpecRecord};
pub use domain::model::{
    CatalogItem, DeviceSuggestion, NewPhone, NewReview, PendingReview, PhoneDetail,
    PublishOutcome, PublishedReview, SpecSheet,
};
pub use domain::session::{Role, SessionContext, SessionManager};
pub use error::{CoreError, CoreResult};
pub use infra::{AppConfig, DiskImageStore, HttpFetcher, StorageBackend};
pub use storage::{CatalogStore, MemoryStore, Page, PgStore};
