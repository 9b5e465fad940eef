//! Admin scrape preview: extraction plus the advisory duplicate check.

use crate::app::catalog_service::CatalogService;
use crate::domain::extract::{Extractor, SpecRecord};
use crate::domain::model::NewPhone;
use crate::domain::session::{Role, SessionContext};
use crate::error::CoreResult;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

/// What the admin sees before confirming a new phone.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScrapePreview {
    pub record: SpecRecord,
    /// Catalog fields prefilled from the record.
    pub suggested: NewPhone,
    /// Existing phone with the same model name, if any. Never blocks the add.
    pub duplicate_of: Option<i64>,
    /// Names of the fields the page did not yield.
    pub missing: Vec<String>,
}

pub struct ScrapeService {
    extractor: Extractor,
    catalog: Arc<CatalogService>,
}

impl ScrapeService {
    pub fn new(extractor: Extractor, catalog: Arc<CatalogService>) -> Self {
        Self { extractor, catalog }
    }

    pub async fn preview(&self, ctx: &SessionContext, url: &str) -> CoreResult<ScrapePreview> {
        ctx.require(Role::Admin)?;
        let record = self.extractor.extract(url).await?;

        let duplicate_of = match record.model_name.as_deref() {
            Some(name) => self.catalog.find_duplicate(name).await?,
            None => None,
        };
        if let Some(id) = duplicate_of {
            info!(phone_id = id, "scraped model already in catalog");
        }

        Ok(ScrapePreview {
            suggested: record.to_new_phone(),
            missing: record.missing().iter().map(|f| f.as_str().to_string()).collect(),
            duplicate_of,
            record,
        })
    }
}
