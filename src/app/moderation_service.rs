//! Review moderation: visitor submissions and the admin publish/reject/delete flow.

use crate::domain::model::{NewReview, PendingReview, PublishOutcome, PublishedReview};
use crate::domain::session::{Role, SessionContext};
use crate::error::{CoreError, CoreResult};
use crate::storage::{CatalogStore, Page};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 5;

pub struct ModerationService {
    store: Arc<dyn CatalogStore>,
    /// Upper bound on pending/rejected listing pages.
    page_size: u32,
}

impl ModerationService {
    pub fn new(store: Arc<dyn CatalogStore>, page_size: u32) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Queues a visitor review for moderation.
    pub async fn submit_review(&self, review: NewReview) -> CoreResult<PendingReview> {
        let review = NewReview {
            author: review.author.trim().to_string(),
            body: review.body.trim().to_string(),
            ..review
        };
        if review.author.is_empty() {
            return Err(CoreError::validation("author name is required"));
        }
        if review.body.is_empty() {
            return Err(CoreError::validation("review text is required"));
        }
        if !(MIN_SCORE..=MAX_SCORE).contains(&review.score) {
            return Err(CoreError::validation(format!(
                "score must be between {} and {}",
                MIN_SCORE, MAX_SCORE
            )));
        }

        let phone = self
            .store
            .get_phone(review.phone_id)
            .await?
            .ok_or_else(|| CoreError::not_found("phone", review.phone_id))?;

        let pending = self
            .store
            .insert_pending_review(&review, &phone.model_name, Utc::now())
            .await?;
        info!(review_id = pending.id, phone_id = pending.phone_id, "review submitted");
        Ok(pending)
    }

    pub async fn publish(&self, ctx: &SessionContext, id: i64) -> CoreResult<PublishOutcome> {
        ctx.require(Role::Admin)?;
        let outcome = self.store.publish_review(id, Utc::now()).await?;
        match &outcome {
            PublishOutcome::Published { aggregate, .. } => info!(
                review_id = id,
                phone_id = aggregate.phone_id,
                score = aggregate.score,
                review_count = aggregate.review_count,
                "review published"
            ),
            PublishOutcome::AlreadyPublished { .. } => {
                info!(review_id = id, "review already published")
            }
        }
        Ok(outcome)
    }

    pub async fn reject(&self, ctx: &SessionContext, id: i64) -> CoreResult<()> {
        ctx.require(Role::Admin)?;
        if !self.store.reject_review(id).await? {
            return Err(CoreError::not_found("pending review", id));
        }
        info!(review_id = id, "review rejected");
        Ok(())
    }

    pub async fn delete(&self, ctx: &SessionContext, id: i64) -> CoreResult<()> {
        ctx.require(Role::Admin)?;
        if !self.store.delete_pending_review(id).await? {
            return Err(CoreError::not_found("pending review", id));
        }
        info!(review_id = id, "review deleted");
        Ok(())
    }

    /// Unchecked reviews in submission order; `limit` is capped at the page size.
    pub async fn list_pending(
        &self,
        ctx: &SessionContext,
        page: Page,
    ) -> CoreResult<Vec<PendingReview>> {
        ctx.require(Role::Admin)?;
        self.store
            .list_pending_reviews(page.capped(self.page_size))
            .await
    }

    pub async fn list_rejected(
        &self,
        ctx: &SessionContext,
        page: Page,
    ) -> CoreResult<Vec<PendingReview>> {
        ctx.require(Role::Admin)?;
        self.store
            .list_rejected_reviews(page.capped(self.page_size))
            .await
    }

    pub async fn published_reviews_for(
        &self,
        phone_id: i64,
        limit: u32,
    ) -> CoreResult<Vec<PublishedReview>> {
        self.store.published_reviews_for(phone_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::NewPhone;
    use crate::domain::scoring::{means_agree, replay_mean};
    use crate::storage::MemoryStore;
    use chrono::Duration;

    fn admin() -> SessionContext {
        SessionContext::with_roles(vec![Role::Admin], Utc::now() + Duration::hours(1))
    }

    async fn setup() -> (ModerationService, Arc<MemoryStore>, i64) {
        let store = Arc::new(MemoryStore::new());
        let phone = store
            .insert_phone(
                &NewPhone {
                    model_name: "Galaxy S21".into(),
                    brand: "Samsung".into(),
                    release_date: None,
                },
                "galaxy-s21-slm.jpg",
                None,
            )
            .await
            .unwrap();
        (ModerationService::new(store.clone(), 20), store, phone.id)
    }

    fn review(phone_id: i64, score: i32) -> NewReview {
        NewReview {
            author: "Ann".into(),
            score,
            body: "Great phone".into(),
            phone_id,
        }
    }

    #[tokio::test]
    async fn submit_validates_input() {
        let (svc, _, phone_id) = setup().await;
        for bad in [
            NewReview { author: " ".into(), ..review(phone_id, 4) },
            NewReview { body: "".into(), ..review(phone_id, 4) },
            review(phone_id, 0),
            review(phone_id, 6),
        ] {
            assert!(matches!(
                svc.submit_review(bad).await.unwrap_err(),
                CoreError::Validation(_)
            ));
        }
        assert!(matches!(
            svc.submit_review(review(phone_id + 100, 4)).await.unwrap_err(),
            CoreError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn publish_moves_review_and_updates_aggregate() {
        let (svc, store, phone_id) = setup().await;
        let pending = svc.submit_review(review(phone_id, 4)).await.unwrap();
        assert_eq!(pending.phone_model, "Galaxy S21");
        assert!(!pending.checked && !pending.posted);

        let outcome = svc.publish(&admin(), pending.id).await.unwrap();
        let PublishOutcome::Published { review, aggregate } = outcome else {
            panic!("expected a fresh publish");
        };
        assert_eq!(review, pending.to_published(review.posted_at));
        assert_eq!(aggregate.review_count, 1);
        assert!(means_agree(aggregate.score, 4.0));

        assert!(svc.list_pending(&admin(), Page::new(20, 0)).await.unwrap().is_empty());
        assert!(store.get_pending_review(pending.id).await.unwrap().is_none());
        assert_eq!(store.get_published_review(pending.id).await.unwrap(), Some(review));
    }

    #[tokio::test]
    async fn publishing_twice_applies_the_score_once() {
        let (svc, store, phone_id) = setup().await;
        let pending = svc.submit_review(review(phone_id, 5)).await.unwrap();

        svc.publish(&admin(), pending.id).await.unwrap();
        let again = svc.publish(&admin(), pending.id).await.unwrap();
        assert_eq!(again, PublishOutcome::AlreadyPublished { review_id: pending.id });

        let phone = store.get_phone(phone_id).await.unwrap().unwrap();
        assert_eq!(phone.review_count, 1);
        assert_eq!(store.published_reviews_for(phone_id, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_publishes_of_one_review_apply_once() {
        let (svc, store, phone_id) = setup().await;
        let svc = Arc::new(svc);
        let id = svc.submit_review(review(phone_id, 3)).await.unwrap().id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.publish(&admin(), id).await })
            })
            .collect();
        let mut fresh = 0;
        for h in handles {
            if matches!(h.await.unwrap().unwrap(), PublishOutcome::Published { .. }) {
                fresh += 1;
            }
        }
        assert_eq!(fresh, 1);
        assert_eq!(store.get_phone(phone_id).await.unwrap().unwrap().review_count, 1);
    }

    #[tokio::test]
    async fn sequential_publishes_give_the_arithmetic_mean() {
        let (svc, store, phone_id) = setup().await;
        let scores = [5, 3, 4, 1, 2, 5];
        for s in scores {
            let p = svc.submit_review(review(phone_id, s)).await.unwrap();
            svc.publish(&admin(), p.id).await.unwrap();
        }
        let phone = store.get_phone(phone_id).await.unwrap().unwrap();
        assert_eq!(phone.review_count, scores.len() as i64);
        let expected = scores.iter().sum::<i32>() as f64 / scores.len() as f64;
        assert!(means_agree(phone.score, expected));

        let published = store.published_reviews_for(phone_id, 100).await.unwrap();
        let (replayed, count) = replay_mean(published.iter().rev().map(|r| r.score));
        assert_eq!(count, phone.review_count);
        assert!(means_agree(replayed, phone.score));
    }

    #[tokio::test]
    async fn reject_and_delete_leave_the_aggregate_alone() {
        let (svc, store, phone_id) = setup().await;
        let a = svc.submit_review(review(phone_id, 1)).await.unwrap();
        let b = svc.submit_review(review(phone_id, 2)).await.unwrap();

        svc.reject(&admin(), a.id).await.unwrap();
        svc.delete(&admin(), b.id).await.unwrap();

        let phone = store.get_phone(phone_id).await.unwrap().unwrap();
        assert_eq!((phone.score, phone.review_count), (0.0, 0));
        assert!(store.published_reviews_for(phone_id, 10).await.unwrap().is_empty());

        assert!(svc.list_pending(&admin(), Page::new(20, 0)).await.unwrap().is_empty());
        let rejected = svc.list_rejected(&admin(), Page::new(20, 0)).await.unwrap();
        assert_eq!(rejected.iter().map(|r| r.id).collect::<Vec<_>>(), vec![a.id]);

        assert!(matches!(
            svc.publish(&admin(), a.id).await.unwrap_err(),
            CoreError::Validation(_)
        ));
        assert!(matches!(
            svc.delete(&admin(), b.id).await.unwrap_err(),
            CoreError::NotFound { .. }
        ));
        assert!(matches!(
            svc.publish(&admin(), 999).await.unwrap_err(),
            CoreError::NotFound { .. }
        ));
        // Rejected reviews can still be deleted.
        svc.delete(&admin(), a.id).await.unwrap();
    }

    #[tokio::test]
    async fn pending_listing_is_ordered_and_capped() {
        let (svc, _, phone_id) = setup().await;
        let svc = ModerationService { page_size: 2, ..svc };
        let mut ids = Vec::new();
        for s in 1..=3 {
            ids.push(svc.submit_review(review(phone_id, s)).await.unwrap().id);
        }
        let first = svc.list_pending(&admin(), Page::new(50, 0)).await.unwrap();
        assert_eq!(first.iter().map(|r| r.id).collect::<Vec<_>>(), ids[..2].to_vec());
        let rest = svc.list_pending(&admin(), Page::new(50, 2)).await.unwrap();
        assert_eq!(rest.iter().map(|r| r.id).collect::<Vec<_>>(), ids[2..].to_vec());
    }

    #[tokio::test]
    async fn admin_operations_require_a_session() {
        let (svc, _, phone_id) = setup().await;
        let p = svc.submit_review(review(phone_id, 4)).await.unwrap();
        let anon = SessionContext::anonymous();
        assert!(matches!(svc.publish(&anon, p.id).await, Err(CoreError::Authorization(_))));
        assert!(matches!(svc.reject(&anon, p.id).await, Err(CoreError::Authorization(_))));
        assert!(matches!(svc.delete(&anon, p.id).await, Err(CoreError::Authorization(_))));
        assert!(matches!(
            svc.list_pending(&anon, Page::new(10, 0)).await,
            Err(CoreError::Authorization(_))
        ));
    }
}
