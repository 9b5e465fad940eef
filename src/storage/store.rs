//! Storage contract consumed by the core services.

use crate::domain::duplicates::DuplicateMatch;
use crate::domain::model::{
    CatalogItem, DeviceSuggestion, NewPhone, NewReview, PendingReview, PublishOutcome,
    PublishedReview, SpecSheet,
};
use crate::error::CoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Limit/offset window for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Same page with `limit` capped at `max`.
    pub fn capped(self, max: u32) -> Self {
        Self {
            limit: self.limit.min(max),
            offset: self.offset,
        }
    }
}

/// Relational store over catalog items, spec sheets, reviews and suggestions.
///
/// Every multi-step write (phone + specs, publish) is atomic: either all of its
/// effects are visible or none are.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn ping(&self) -> CoreResult<()>;

    /// Inserts a phone (and optionally its spec sheet) under a freshly assigned identifier.
    async fn insert_phone(
        &self,
        phone: &NewPhone,
        image: &str,
        specs: Option<&SpecSheet>,
    ) -> CoreResult<CatalogItem>;

    /// Creates or replaces the spec sheet of an existing phone.
    async fn upsert_spec_sheet(&self, phone_id: i64, specs: &SpecSheet) -> CoreResult<()>;

    async fn get_phone(&self, id: i64) -> CoreResult<Option<CatalogItem>>;

    async fn get_spec_sheet(&self, phone_id: i64) -> CoreResult<Option<SpecSheet>>;

    /// Newest first.
    async fn list_phones(&self, page: Page) -> CoreResult<Vec<CatalogItem>>;

    /// Case-insensitive brand match, newest first.
    async fn list_phones_by_brand(&self, brand: &str, page: Page) -> CoreResult<Vec<CatalogItem>>;

    /// Case-insensitive substring match on model name or brand, newest first.
    async fn search_phones(&self, query: &str, limit: u32) -> CoreResult<Vec<CatalogItem>>;

    /// Distinct brands, sorted.
    async fn list_brands(&self) -> CoreResult<Vec<String>>;

    /// Lowest identifier whose model name matches under `mode`.
    async fn find_phone_by_model(
        &self,
        model_name: &str,
        mode: DuplicateMatch,
    ) -> CoreResult<Option<i64>>;

    async fn insert_pending_review(
        &self,
        review: &NewReview,
        phone_model: &str,
        submitted_at: DateTime<Utc>,
    ) -> CoreResult<PendingReview>;

    async fn get_pending_review(&self, id: i64) -> CoreResult<Option<PendingReview>>;

    /// Unchecked, unposted reviews in insertion order.
    async fn list_pending_reviews(&self, page: Page) -> CoreResult<Vec<PendingReview>>;

    /// Rejected reviews in insertion order.
    async fn list_rejected_reviews(&self, page: Page) -> CoreResult<Vec<PendingReview>>;

    /// Atomically: claim the pending review (only if not posted and not rejected),
    /// create the published copy, fold its score into the phone aggregate and drop
    /// the pending row. A second call for the same id is a no-op.
    async fn publish_review(
        &self,
        id: i64,
        posted_at: DateTime<Utc>,
    ) -> CoreResult<PublishOutcome>;

    /// Marks a pending review as rejected. `false` when no such pending review exists.
    async fn reject_review(&self, id: i64) -> CoreResult<bool>;

    /// Removes a pending review. `false` when no such pending review exists.
    async fn delete_pending_review(&self, id: i64) -> CoreResult<bool>;

    async fn get_published_review(&self, id: i64) -> CoreResult<Option<PublishedReview>>;

    /// Newest first.
    async fn published_reviews_for(
        &self,
        phone_id: i64,
        limit: u32,
    ) -> CoreResult<Vec<PublishedReview>>;

    async fn insert_suggestion(
        &self,
        model_name: &str,
        suggested_at: DateTime<Utc>,
    ) -> CoreResult<DeviceSuggestion>;

    /// Newest first.
    async fn list_suggestions(&self, limit: u32) -> CoreResult<Vec<DeviceSuggestion>>;
}
