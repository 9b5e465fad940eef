pub mod catalog_service;
pub mod moderation_service;
pub mod scrape_service;

pub use catalog_service::{image_file_name, slugify, CatalogService, ImageUpload};
pub use moderation_service::ModerationService;
pub use scrape_service::{ScrapePreview, ScrapeService};
