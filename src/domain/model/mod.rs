//! Catalog, review and suggestion records.

pub mod catalog;
pub mod review;
pub mod spec_sheet;
pub mod suggestion;

pub use catalog::{CatalogItem, NewPhone, PhoneDetail};
pub use review::{NewReview, PendingReview, PublishOutcome, PublishedReview, ScoreUpdate};
pub use spec_sheet::SpecSheet;
pub use suggestion::{DeviceSuggestion, MAX_SUGGESTION_LEN};
