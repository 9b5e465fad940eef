//! PostgreSQL store against a real database.
//!
//! Skipped unless `DATABASE_URL` is set. Uses unique model names so it can run
//! against a database that already holds data.

use chrono::Utc;
use slmobi::domain::duplicates::DuplicateMatch;
use slmobi::domain::scoring::{means_agree, replay_mean};
use slmobi::storage::{CatalogStore, Page, PgStore};
use slmobi::{NewPhone, NewReview, PublishOutcome, SpecSheet};
use std::error::Error;
use std::sync::Arc;

async fn store() -> Result<Option<Arc<PgStore>>, Box<dyn Error>> {
    dotenv::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        println!("DATABASE_URL not set; skipping PostgreSQL store test");
        return Ok(None);
    };
    Ok(Some(Arc::new(PgStore::connect(&url, 5).await?)))
}

fn unique(prefix: &str) -> String {
    format!("{} {}", prefix, Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

async fn new_phone(store: &PgStore, name: &str) -> Result<i64, Box<dyn Error>> {
    let phone = NewPhone {
        model_name: name.to_string(),
        brand: "Testco".to_string(),
        release_date: None,
    };
    Ok(store.insert_phone(&phone, "test-slm.jpg", None).await?.id)
}

fn review(phone_id: i64, score: i32) -> NewReview {
    NewReview {
        author: "Ann".to_string(),
        score,
        body: "Great phone".to_string(),
        phone_id,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn publish_is_atomic_and_idempotent() -> Result<(), Box<dyn Error>> {
    let Some(store) = store().await? else {
        return Ok(());
    };
    let name = unique("Publish Phone");
    let phone_id = new_phone(&store, &name).await?;

    let mut scores = Vec::new();
    for s in [4, 2, 5] {
        let pending = store.insert_pending_review(&review(phone_id, s), &name, Utc::now()).await?;
        assert!(!pending.posted && !pending.checked);

        // Several concurrent publishers; exactly one wins.
        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            let id = pending.id;
            handles.push(tokio::spawn(async move { store.publish_review(id, Utc::now()).await }));
        }
        let mut fresh = 0;
        for h in handles {
            if let PublishOutcome::Published { review, .. } = h.await?? {
                assert_eq!(review.id, pending.id);
                assert_eq!(review.body, pending.body);
                fresh += 1;
            }
        }
        assert_eq!(fresh, 1);
        assert!(store.get_pending_review(pending.id).await?.is_none());
        scores.push(s);
    }

    let phone = store.get_phone(phone_id).await?.ok_or("phone vanished")?;
    assert_eq!(phone.review_count, 3);
    let published = store.published_reviews_for(phone_id, 10).await?;
    assert_eq!(published.len(), 3);
    let (mean, count) = replay_mean(published.iter().map(|r| r.score));
    assert_eq!(count, 3);
    assert!(means_agree(mean, phone.score));
    assert!(means_agree(phone.score, 11.0 / 3.0));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reject_delete_and_listings() -> Result<(), Box<dyn Error>> {
    let Some(store) = store().await? else {
        return Ok(());
    };
    let name = unique("Moderation Phone");
    let phone_id = new_phone(&store, &name).await?;

    let a = store.insert_pending_review(&review(phone_id, 1), &name, Utc::now()).await?;
    let b = store.insert_pending_review(&review(phone_id, 2), &name, Utc::now()).await?;
    assert!(b.id > a.id);

    assert!(store.reject_review(a.id).await?);
    let pending = store.list_pending_reviews(Page::new(1000, 0)).await?;
    assert!(pending.iter().all(|r| !r.checked));
    assert!(pending.iter().any(|r| r.id == b.id));
    assert!(!pending.iter().any(|r| r.id == a.id));
    let rejected = store.list_rejected_reviews(Page::new(1000, 0)).await?;
    assert!(rejected.iter().any(|r| r.id == a.id));

    assert!(matches!(
        store.publish_review(a.id, Utc::now()).await,
        Err(slmobi::CoreError::Validation(_))
    ));
    assert!(store.delete_pending_review(b.id).await?);
    assert!(!store.delete_pending_review(b.id).await?);

    let phone = store.get_phone(phone_id).await?.ok_or("phone vanished")?;
    assert_eq!((phone.score, phone.review_count), (0.0, 0));
    assert!(store.published_reviews_for(phone_id, 10).await?.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn catalog_rows_specs_and_duplicates() -> Result<(), Box<dyn Error>> {
    let Some(store) = store().await? else {
        return Ok(());
    };
    let name = unique("Dup_Phone 100%");
    let specs = SpecSheet {
        weight: Some("169 g".into()),
        ..Default::default()
    };
    let phone = NewPhone {
        model_name: name.clone(),
        brand: "Testco".into(),
        release_date: Some("2021".into()),
    };
    let item = store.insert_phone(&phone, "dup-slm.png", Some(&specs)).await?;
    assert_eq!(store.get_spec_sheet(item.id).await?, Some(specs));

    assert_eq!(store.find_phone_by_model(&name, DuplicateMatch::Exact).await?, Some(item.id));
    assert_eq!(store.find_phone_by_model(&name.to_uppercase(), DuplicateMatch::Exact).await?, None);
    let spaced = format!("  {}  ", name.to_lowercase().replace(' ', "   "));
    assert_eq!(
        store.find_phone_by_model(&spaced, DuplicateMatch::Normalized).await?,
        Some(item.id)
    );

    // Wildcards in the query are literal.
    let hits = store.search_phones("Dup_Phone 100%", 50).await?;
    assert!(hits.iter().any(|p| p.id == item.id));
    assert!(hits.iter().all(|p| p.model_name.contains("Dup_Phone 100%")));

    assert!(matches!(
        store.upsert_spec_sheet(-1, &SpecSheet::default()).await,
        Err(slmobi::CoreError::NotFound { .. })
    ));
    Ok(())
}
