//! PostgreSQL `CatalogStore`.

use crate::domain::duplicates::{normalize_model_name, DuplicateMatch};
use crate::domain::model::{
    CatalogItem, DeviceSuggestion, NewPhone, NewReview, PendingReview, PublishOutcome,
    PublishedReview, ScoreUpdate, SpecSheet,
};
use crate::domain::scoring::apply_score;
use crate::error::{CoreError, CoreResult};
use crate::storage::store::{CatalogStore, Page};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgConnection, PgPool, Row};
use tracing::{debug, info};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS phones (
        id BIGSERIAL PRIMARY KEY,
        model_name TEXT NOT NULL,
        brand TEXT NOT NULL,
        image TEXT NOT NULL,
        release_date TEXT,
        score DOUBLE PRECISION NOT NULL DEFAULT 0,
        review_count BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS phones_model_name_idx ON phones (model_name)",
    "CREATE INDEX IF NOT EXISTS phones_brand_idx ON phones (lower(brand))",
    "CREATE TABLE IF NOT EXISTS spec_sheets (
        phone_id BIGINT PRIMARY KEY REFERENCES phones(id) ON DELETE CASCADE,
        dimensions TEXT,
        weight TEXT,
        display_size TEXT,
        os TEXT,
        chipset TEXT,
        internal_memory TEXT,
        main_camera TEXT,
        selfie_camera TEXT,
        battery TEXT
    )",
    "CREATE TABLE IF NOT EXISTS pending_reviews (
        id BIGSERIAL PRIMARY KEY,
        author TEXT NOT NULL,
        submitted_at TIMESTAMPTZ NOT NULL,
        score INTEGER NOT NULL,
        body TEXT NOT NULL,
        phone_id BIGINT NOT NULL REFERENCES phones(id),
        phone_model TEXT NOT NULL,
        checked BOOLEAN NOT NULL DEFAULT FALSE,
        posted BOOLEAN NOT NULL DEFAULT FALSE
    )",
    "CREATE TABLE IF NOT EXISTS published_reviews (
        id BIGINT PRIMARY KEY,
        author TEXT NOT NULL,
        submitted_at TIMESTAMPTZ NOT NULL,
        score INTEGER NOT NULL,
        body TEXT NOT NULL,
        phone_id BIGINT NOT NULL REFERENCES phones(id),
        phone_model TEXT NOT NULL,
        posted_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS published_reviews_phone_idx ON published_reviews (phone_id)",
    "CREATE TABLE IF NOT EXISTS device_suggestions (
        id BIGSERIAL PRIMARY KEY,
        model_name TEXT NOT NULL,
        suggested_at TIMESTAMPTZ NOT NULL
    )",
];

const PHONE_COLUMNS: &str =
    "id, model_name, brand, image, release_date, score, review_count, created_at";
const PENDING_COLUMNS: &str =
    "id, author, submitted_at, score, body, phone_id, phone_model, checked, posted";
const PUBLISHED_COLUMNS: &str =
    "id, author, submitted_at, score, body, phone_id, phone_model, posted_at";
const SPEC_COLUMNS: &str = "dimensions, weight, display_size, os, chipset, internal_memory, \
     main_camera, selfie_camera, battery";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects and makes sure every table exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let store = Self::from_pool(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("catalog schema ready");
        Ok(())
    }

    /// Explains why the conditional claim in `publish_review` matched nothing.
    async fn unpublishable(&self, id: i64) -> CoreResult<PublishOutcome> {
        let published: Option<i64> =
            sqlx::query_scalar("SELECT id FROM published_reviews WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        if published.is_some() {
            return Ok(PublishOutcome::AlreadyPublished { review_id: id });
        }

        let flags: Option<(bool, bool)> =
            sqlx::query_as("SELECT checked, posted FROM pending_reviews WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        match flags {
            Some((_, true)) => Ok(PublishOutcome::AlreadyPublished { review_id: id }),
            Some((true, false)) => Err(CoreError::validation(format!(
                "review {} was rejected and cannot be published",
                id
            ))),
            _ => Err(CoreError::not_found("review", id)),
        }
    }
}

fn phone_from_row(row: &PgRow) -> Result<CatalogItem, sqlx::Error> {
    Ok(CatalogItem {
        id: row.try_get("id")?,
        model_name: row.try_get("model_name")?,
        brand: row.try_get("brand")?,
        image: row.try_get("image")?,
        release_date: row.try_get("release_date")?,
        score: row.try_get("score")?,
        review_count: row.try_get("review_count")?,
        created_at: row.try_get("created_at")?,
    })
}

fn spec_from_row(row: &PgRow) -> Result<SpecSheet, sqlx::Error> {
    Ok(SpecSheet {
        dimensions: row.try_get("dimensions")?,
        weight: row.try_get("weight")?,
        display_size: row.try_get("display_size")?,
        os: row.try_get("os")?,
        chipset: row.try_get("chipset")?,
        internal_memory: row.try_get("internal_memory")?,
        main_camera: row.try_get("main_camera")?,
        selfie_camera: row.try_get("selfie_camera")?,
        battery: row.try_get("battery")?,
    })
}

fn pending_from_row(row: &PgRow) -> Result<PendingReview, sqlx::Error> {
    Ok(PendingReview {
        id: row.try_get("id")?,
        author: row.try_get("author")?,
        submitted_at: row.try_get("submitted_at")?,
        score: row.try_get("score")?,
        body: row.try_get("body")?,
        phone_id: row.try_get("phone_id")?,
        phone_model: row.try_get("phone_model")?,
        checked: row.try_get("checked")?,
        posted: row.try_get("posted")?,
    })
}

fn published_from_row(row: &PgRow) -> Result<PublishedReview, sqlx::Error> {
    Ok(PublishedReview {
        id: row.try_get("id")?,
        author: row.try_get("author")?,
        submitted_at: row.try_get("submitted_at")?,
        score: row.try_get("score")?,
        body: row.try_get("body")?,
        phone_id: row.try_get("phone_id")?,
        phone_model: row.try_get("phone_model")?,
        posted_at: row.try_get("posted_at")?,
    })
}

fn collect<T>(
    rows: Vec<PgRow>,
    map: fn(&PgRow) -> Result<T, sqlx::Error>,
) -> CoreResult<Vec<T>> {
    rows.iter().map(|r| map(r).map_err(CoreError::from)).collect()
}

/// `ILIKE` pattern matching `query` anywhere, with wildcards in `query` taken literally.
fn contains_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

async fn write_spec_sheet(
    conn: &mut PgConnection,
    phone_id: i64,
    specs: &SpecSheet,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "INSERT INTO spec_sheets (phone_id, {SPEC_COLUMNS})
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         ON CONFLICT (phone_id) DO UPDATE SET
            dimensions = EXCLUDED.dimensions,
            weight = EXCLUDED.weight,
            display_size = EXCLUDED.display_size,
            os = EXCLUDED.os,
            chipset = EXCLUDED.chipset,
            internal_memory = EXCLUDED.internal_memory,
            main_camera = EXCLUDED.main_camera,
            selfie_camera = EXCLUDED.selfie_camera,
            battery = EXCLUDED.battery"
    ))
    .bind(phone_id)
    .bind(&specs.dimensions)
    .bind(&specs.weight)
    .bind(&specs.display_size)
    .bind(&specs.os)
    .bind(&specs.chipset)
    .bind(&specs.internal_memory)
    .bind(&specs.main_camera)
    .bind(&specs.selfie_camera)
    .bind(&specs.battery)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn ping(&self) -> CoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_phone(
        &self,
        phone: &NewPhone,
        image: &str,
        specs: Option<&SpecSheet>,
    ) -> CoreResult<CatalogItem> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "INSERT INTO phones (model_name, brand, image, release_date)
             VALUES ($1, $2, $3, $4)
             RETURNING {PHONE_COLUMNS}"
        ))
        .bind(&phone.model_name)
        .bind(&phone.brand)
        .bind(image)
        .bind(&phone.release_date)
        .fetch_one(&mut *tx)
        .await?;
        let item = phone_from_row(&row)?;

        if let Some(specs) = specs {
            write_spec_sheet(&mut *tx, item.id, specs).await?;
        }

        tx.commit().await?;
        debug!(phone_id = item.id, "phone inserted");
        Ok(item)
    }

    async fn upsert_spec_sheet(&self, phone_id: i64, specs: &SpecSheet) -> CoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM phones WHERE id = $1 FOR UPDATE")
            .bind(phone_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            tx.rollback().await?;
            return Err(CoreError::not_found("phone", phone_id));
        }
        write_spec_sheet(&mut *tx, phone_id, specs).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_phone(&self, id: i64) -> CoreResult<Option<CatalogItem>> {
        let row = sqlx::query(&format!("SELECT {PHONE_COLUMNS} FROM phones WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(phone_from_row).transpose()?)
    }

    async fn get_spec_sheet(&self, phone_id: i64) -> CoreResult<Option<SpecSheet>> {
        let row = sqlx::query(&format!(
            "SELECT {SPEC_COLUMNS} FROM spec_sheets WHERE phone_id = $1"
        ))
        .bind(phone_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(spec_from_row).transpose()?)
    }

    async fn list_phones(&self, page: Page) -> CoreResult<Vec<CatalogItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {PHONE_COLUMNS} FROM phones ORDER BY id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await?;
        collect(rows, phone_from_row)
    }

    async fn list_phones_by_brand(&self, brand: &str, page: Page) -> CoreResult<Vec<CatalogItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {PHONE_COLUMNS} FROM phones
             WHERE lower(brand) = lower($1)
             ORDER BY id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(brand)
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await?;
        collect(rows, phone_from_row)
    }

    async fn search_phones(&self, query: &str, limit: u32) -> CoreResult<Vec<CatalogItem>> {
        let rows = sqlx::query(&format!(
            r"SELECT {PHONE_COLUMNS} FROM phones
              WHERE model_name ILIKE $1 ESCAPE '\' OR brand ILIKE $1 ESCAPE '\'
              ORDER BY id DESC LIMIT $2"
        ))
        .bind(contains_pattern(query))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        collect(rows, phone_from_row)
    }

    async fn list_brands(&self) -> CoreResult<Vec<String>> {
        let brands: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT brand FROM phones ORDER BY brand")
                .fetch_all(&self.pool)
                .await?;
        Ok(brands)
    }

    async fn find_phone_by_model(
        &self,
        model_name: &str,
        mode: DuplicateMatch,
    ) -> CoreResult<Option<i64>> {
        let id: Option<i64> = match mode {
            DuplicateMatch::Exact => {
                sqlx::query_scalar("SELECT id FROM phones WHERE model_name = $1 ORDER BY id LIMIT 1")
                    .bind(model_name)
                    .fetch_optional(&self.pool)
                    .await?
            }
            DuplicateMatch::Normalized => {
                sqlx::query_scalar(
                    r"SELECT id FROM phones
                      WHERE lower(btrim(regexp_replace(model_name, '\s+', ' ', 'g'))) = $1
                      ORDER BY id LIMIT 1",
                )
                .bind(normalize_model_name(model_name))
                .fetch_optional(&self.pool)
                .await?
            }
        };
        Ok(id)
    }

    async fn insert_pending_review(
        &self,
        review: &NewReview,
        phone_model: &str,
        submitted_at: DateTime<Utc>,
    ) -> CoreResult<PendingReview> {
        let row = sqlx::query(&format!(
            "INSERT INTO pending_reviews (author, submitted_at, score, body, phone_id, phone_model)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PENDING_COLUMNS}"
        ))
        .bind(&review.author)
        .bind(submitted_at)
        .bind(review.score)
        .bind(&review.body)
        .bind(review.phone_id)
        .bind(phone_model)
        .fetch_one(&self.pool)
        .await?;
        Ok(pending_from_row(&row)?)
    }

    async fn get_pending_review(&self, id: i64) -> CoreResult<Option<PendingReview>> {
        let row = sqlx::query(&format!(
            "SELECT {PENDING_COLUMNS} FROM pending_reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(pending_from_row).transpose()?)
    }

    async fn list_pending_reviews(&self, page: Page) -> CoreResult<Vec<PendingReview>> {
        let rows = sqlx::query(&format!(
            "SELECT {PENDING_COLUMNS} FROM pending_reviews
             WHERE checked = FALSE AND posted = FALSE
             ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await?;
        collect(rows, pending_from_row)
    }

    async fn list_rejected_reviews(&self, page: Page) -> CoreResult<Vec<PendingReview>> {
        let rows = sqlx::query(&format!(
            "SELECT {PENDING_COLUMNS} FROM pending_reviews
             WHERE checked = TRUE
             ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await?;
        collect(rows, pending_from_row)
    }

    async fn publish_review(
        &self,
        id: i64,
        posted_at: DateTime<Utc>,
    ) -> CoreResult<PublishOutcome> {
        let mut tx = self.pool.begin().await?;

        // Only one concurrent caller can flip `posted`; the rest see no row.
        let claimed = sqlx::query(&format!(
            "UPDATE pending_reviews SET posted = TRUE
             WHERE id = $1 AND posted = FALSE AND checked = FALSE
             RETURNING {PENDING_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = claimed else {
            tx.rollback().await?;
            return self.unpublishable(id).await;
        };
        let pending = pending_from_row(&row)?;

        let aggregate: Option<(f64, i64)> =
            sqlx::query_as("SELECT score, review_count FROM phones WHERE id = $1 FOR UPDATE")
                .bind(pending.phone_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((mean, count)) = aggregate else {
            tx.rollback().await?;
            return Err(CoreError::not_found("phone", pending.phone_id));
        };
        let (score, review_count) = apply_score(mean, count, pending.score);

        sqlx::query("UPDATE phones SET score = $1, review_count = $2 WHERE id = $3")
            .bind(score)
            .bind(review_count)
            .bind(pending.phone_id)
            .execute(&mut *tx)
            .await?;

        let review = pending.to_published(posted_at);
        sqlx::query(&format!(
            "INSERT INTO published_reviews ({PUBLISHED_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(review.id)
        .bind(&review.author)
        .bind(review.submitted_at)
        .bind(review.score)
        .bind(&review.body)
        .bind(review.phone_id)
        .bind(&review.phone_model)
        .bind(review.posted_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM pending_reviews WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

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
        let result =
            sqlx::query("UPDATE pending_reviews SET checked = TRUE WHERE id = $1 AND posted = FALSE")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_pending_review(&self, id: i64) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM pending_reviews WHERE id = $1 AND posted = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_published_review(&self, id: i64) -> CoreResult<Option<PublishedReview>> {
        let row = sqlx::query(&format!(
            "SELECT {PUBLISHED_COLUMNS} FROM published_reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(published_from_row).transpose()?)
    }

    async fn published_reviews_for(
        &self,
        phone_id: i64,
        limit: u32,
    ) -> CoreResult<Vec<PublishedReview>> {
        let rows = sqlx::query(&format!(
            "SELECT {PUBLISHED_COLUMNS} FROM published_reviews
             WHERE phone_id = $1
             ORDER BY posted_at DESC, id DESC LIMIT $2"
        ))
        .bind(phone_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        collect(rows, published_from_row)
    }

    async fn insert_suggestion(
        &self,
        model_name: &str,
        suggested_at: DateTime<Utc>,
    ) -> CoreResult<DeviceSuggestion> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO device_suggestions (model_name, suggested_at) VALUES ($1, $2) RETURNING id",
        )
        .bind(model_name)
        .bind(suggested_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(DeviceSuggestion {
            id,
            model_name: model_name.to_string(),
            suggested_at,
        })
    }

    async fn list_suggestions(&self, limit: u32) -> CoreResult<Vec<DeviceSuggestion>> {
        let rows: Vec<(i64, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, model_name, suggested_at FROM device_suggestions ORDER BY id DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, model_name, suggested_at)| DeviceSuggestion {
                id,
                model_name,
                suggested_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("s21"), "%s21%");
        assert_eq!(contains_pattern("100%_x"), r"%100\%\_x%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
