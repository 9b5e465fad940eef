use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A model name a visitor would like to see in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeviceSuggestion {
    pub id: i64,
    pub model_name: String,
    pub suggested_at: DateTime<Utc>,
}

pub const MAX_SUGGESTION_LEN: usize = 200;
