pub mod config;
pub mod http_fetch;
pub mod image_store;
pub mod logging;

pub use config::{AppConfig, StorageBackend};
pub use http_fetch::{HttpFetcher, PageFetcher};
pub use image_store::{DiskImageStore, ImageStore};
