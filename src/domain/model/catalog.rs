use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PublishedReview, SpecSheet};

/// A single phone model entry with identity, display metadata and aggregate rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CatalogItem {
    pub id: i64,
    pub model_name: String,
    pub brand: String,
    /// Stored image file name (not a path).
    pub image: String,
    pub release_date: Option<String>,
    /// Running mean of published review scores.
    pub score: f64,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields an admin supplies (or confirms from a scrape) when adding a phone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewPhone {
    pub model_name: String,
    pub brand: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl NewPhone {
    /// Trims every field; an empty release date becomes `None`.
    pub fn normalized(&self) -> Self {
        Self {
            model_name: self.model_name.trim().to_string(),
            brand: self.brand.trim().to_string(),
            release_date: self
                .release_date
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// Everything the public phone page shows.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PhoneDetail {
    pub phone: CatalogItem,
    pub specs: Option<SpecSheet>,
    pub reviews: Vec<PublishedReview>,
}
