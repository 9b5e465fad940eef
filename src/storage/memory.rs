//! In-process `CatalogStore`.
//!
//! Every operation runs under one lock, which gives the same atomicity the
//! PostgreSQL store gets from transactions. Used by tests and by
//! `STORAGE_BACKEND=memory`.

use crate::domain::duplicates::DuplicateMatch;
use crate::domain::model::{
    CatalogItem, DeviceSuggestion, NewPhone, NewReview, PendingReview, PublishOutcome,
    PublishedReview, ScoreUpdate, SpecSheet,
};
use crate::domain::scoring::apply_score;
use crate::error::{CoreError, CoreResult};
use crate::storage::store::{CatalogStore, Page};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    phones: BTreeMap<i64, CatalogItem>,
    specs: HashMap<i64, SpecSheet>,
    pending: BTreeMap<i64, PendingReview>,
    published: BTreeMap<i64, PublishedReview>,
    suggestions: BTreeMap<i64, DeviceSuggestion>,
    /// Highest identifier handed out per sequence.
    phone_watermark: i64,
    review_watermark: i64,
    suggestion_watermark: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn window<T: Clone>(items: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    items
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn ping(&self) -> CoreResult<()> {
        Ok(())
    }

    async fn insert_phone(
        &self,
        phone: &NewPhone,
        image: &str,
        specs: Option<&SpecSheet>,
    ) -> CoreResult<CatalogItem> {
        let mut t = self.tables.lock().await;
        t.phone_watermark += 1;
        let item = CatalogItem {
            id: t.phone_watermark,
            model_name: phone.model_name.clone(),
            brand: phone.brand.clone(),
            image: image.to_string(),
            release_date: phone.release_date.clone(),
            score: 0.0,
            review_count: 0,
            created_at: Utc::now(),
        };
        t.phones.insert(item.id, item.clone());
        if let Some(specs) = specs {
            t.specs.insert(item.id, specs.clone());
        }
        Ok(item)
    }

    async fn upsert_spec_sheet(&self, phone_id: i64, specs: &SpecSheet) -> CoreResult<()> {
        let mut t = self.tables.lock().await;
        if !t.phones.contains_key(&phone_id) {
            return Err(CoreError::not_found("phone", phone_id));
        }
        t.specs.insert(phone_id, specs.clone());
        Ok(())
    }

    async fn get_phone(&self, id: i64) -> CoreResult<Option<CatalogItem>> {
        Ok(self.tables.lock().await.phones.get(&id).cloned())
    }

    async fn get_spec_sheet(&self, phone_id: i64) -> CoreResult<Option<SpecSheet>> {
        Ok(self.tables.lock().await.specs.get(&phone_id).cloned())
    }

    async fn list_phones(&self, page: Page) -> CoreResult<Vec<CatalogItem>> {
        let t = self.tables.lock().await;
        Ok(window(t.phones.values().rev().cloned(), page))
    }

    async fn list_phones_by_brand(&self, brand: &str, page: Page) -> CoreResult<Vec<CatalogItem>> {
        let brand = brand.to_lowercase();
        let t = self.tables.lock().await;
        Ok(window(
            t.phones
                .values()
                .rev()
                .filter(|p| p.brand.to_lowercase() == brand)
                .cloned(),
            page,
        ))
    }

    async fn search_phones(&self, query: &str, limit: u32) -> CoreResult<Vec<CatalogItem>> {
        let q = query.to_lowercase();
        let t = self.tables.lock().await;
        Ok(t.phones
            .values()
            .rev()
            .filter(|p| p.model_name.to_lowercase().contains(&q) || p.brand.to_lowercase().contains(&q))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_brands(&self) -> CoreResult<Vec<String>> {
        let t = self.tables.lock().await;
        let brands: BTreeSet<String> = t.phones.values().map(|p| p.brand.clone()).collect();
        Ok(brands.into_iter().collect())
    }

    async fn find_phone_by_model(
        &self,
        model_name: &str,
        mode: DuplicateMatch,
    ) -> CoreResult<Option<i64>> {
        let key = mode.key(model_name);
        let t = self.tables.lock().await;
        Ok(t.phones
            .values()
            .find(|p| mode.key(&p.model_name) == key)
            .map(|p| p.id))
    }

    async fn insert_pending_review(
        &self,
        review: &NewReview,
        phone_model: &str,
        submitted_at: DateTime<Utc>,
    ) -> CoreResult<PendingReview> {
        let mut t = self.tables.lock().await;
        if !t.phones.contains_key(&review.phone_id) {
            return Err(CoreError::not_found("phone", review.phone_id));
        }
        t.review_watermark += 1;
        let pending = PendingReview {
            id: t.review_watermark,
            author: review.author.clone(),
            submitted_at,
            score: review.score,
            body: review.body.clone(),
            phone_id: review.phone_id,
            phone_model: phone_model.to_string(),
            checked: false,
            posted: false,
        };
        t.pending.insert(pending.id, pending.clone());
        Ok(pending)
    }

    async fn get_pending_review(&self, id: i64) -> CoreResult<Option<PendingReview>> {
        Ok(self.tables.lock().await.pending.get(&id).cloned())
    }

    async fn list_pending_reviews(&self, page: Page) -> CoreResult<Vec<PendingReview>> {
        let t = self.tables.lock().await;
        Ok(window(
            t.pending.values().filter(|r| !r.checked && !r.posted).cloned(),
            page,
        ))
    }

    async fn list_rejected_reviews(&self, page: Page) -> CoreResult<Vec<PendingReview>> {
        let t = self.tables.lock().await;
        Ok(window(t.pending.values().filter(|r| r.checked).cloned(), page))
    }

    async fn publish_review(
        &self,
        id: i64,
        posted_at: DateTime<Utc>,
    ) -> CoreResult<PublishOutcome> {
        let mut t = self.tables.lock().await;

        let pending = match t.pending.get(&id) {
            Some(p) if p.posted => return Ok(PublishOutcome::AlreadyPublished { review_id: id }),
            Some(p) if p.checked => {
                return Err(CoreError::validation(format!(
                    "review {} was rejected and cannot be published",
                    id
                )))
            }
            Some(p) => p.clone(),
            None if t.published.contains_key(&id) => {
                return Ok(PublishOutcome::AlreadyPublished { review_id: id })
            }
            None => return Err(CoreError::not_found("review", id)),
        };

        let phone = t
            .phones
            .get_mut(&pending.phone_id)
            .ok_or_else(|| CoreError::not_found("phone", pending.phone_id))?;
        let (score, review_count) = apply_score(phone.score, phone.review_count, pending.score);
        phone.score = score;
        phone.review_count = review_count;

        let review = pending.to_published(posted_at);
        t.published.insert(id, review.clone());
        t.pending.remove(&id);

        Ok(PublishOutcome::Published {
            review,
            aggregate: ScoreUpdate {
                phone_id: pending.phone_id,
                score,
                review_count,
            },
        })
    }

    async fn reject_review(&self, id: i64) -> CoreResult<bool> {
        let mut t = self.tables.lock().await;
        match t.pending.get_mut(&id) {
            Some(r) if !r.posted => {
                r.checked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_pending_review(&self, id: i64) -> CoreResult<bool> {
        let mut t = self.tables.lock().await;
        match t.pending.get(&id) {
            Some(r) if !r.posted => {
                t.pending.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_published_review(&self, id: i64) -> CoreResult<Option<PublishedReview>> {
        Ok(self.tables.lock().await.published.get(&id).cloned())
    }

    async fn published_reviews_for(
        &self,
        phone_id: i64,
        limit: u32,
    ) -> CoreResult<Vec<PublishedReview>> {
        let t = self.tables.lock().await;
        let mut reviews: Vec<PublishedReview> = t
            .published
            .values()
            .filter(|r| r.phone_id == phone_id)
            .cloned()
            .collect();
        // Latest publication first, matching the SQL ordering.
        reviews.sort_by(|a, b| b.posted_at.cmp(&a.posted_at).then(b.id.cmp(&a.id)));
        reviews.truncate(limit as usize);
        Ok(reviews)
    }

    async fn insert_suggestion(
        &self,
        model_name: &str,
        suggested_at: DateTime<Utc>,
    ) -> CoreResult<DeviceSuggestion> {
        let mut t = self.tables.lock().await;
        t.suggestion_watermark += 1;
        let suggestion = DeviceSuggestion {
            id: t.suggestion_watermark,
            model_name: model_name.to_string(),
            suggested_at,
        };
        t.suggestions.insert(suggestion.id, suggestion.clone());
        Ok(suggestion)
    }

    async fn list_suggestions(&self, limit: u32) -> CoreResult<Vec<DeviceSuggestion>> {
        let t = self.tables.lock().await;
        Ok(t.suggestions.values().rev().take(limit as usize).cloned().collect())
    }
}
