use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Visitor input for a new review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewReview {
    pub author: String,
    pub score: i32,
    pub body: String,
    pub phone_id: i64,
}

/// A review awaiting moderation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PendingReview {
    pub id: i64,
    pub author: String,
    pub submitted_at: DateTime<Utc>,
    pub score: i32,
    pub body: String,
    pub phone_id: i64,
    /// Model name captured at submission time.
    pub phone_model: String,
    /// Set when an admin rejects the review.
    pub checked: bool,
    pub posted: bool,
}

impl PendingReview {
    /// Builds the published copy; the identifier is carried over.
    pub fn to_published(&self, posted_at: DateTime<Utc>) -> PublishedReview {
        PublishedReview {
            id: self.id,
            author: self.author.clone(),
            submitted_at: self.submitted_at,
            score: self.score,
            body: self.body.clone(),
            phone_id: self.phone_id,
            phone_model: self.phone_model.clone(),
            posted_at,
        }
    }
}

/// A moderated, publicly visible review. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PublishedReview {
    pub id: i64,
    pub author: String,
    pub submitted_at: DateTime<Utc>,
    pub score: i32,
    pub body: String,
    pub phone_id: i64,
    pub phone_model: String,
    pub posted_at: DateTime<Utc>,
}

/// Aggregate values of a catalog item after a publish.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct ScoreUpdate {
    pub phone_id: i64,
    pub score: f64,
    pub review_count: i64,
}

/// Result of a publish request.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PublishOutcome {
    Published {
        review: PublishedReview,
        aggregate: ScoreUpdate,
    },
    /// The review had already been published; nothing changed.
    AlreadyPublished { review_id: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> PendingReview {
        PendingReview {
            id: 3,
            author: "Ann".into(),
            submitted_at: Utc::now(),
            score: 4,
            body: "Great phone".into(),
            phone_id: 7,
            phone_model: "Galaxy S21".into(),
            checked: false,
            posted: false,
        }
    }

    #[test]
    fn published_copy_keeps_identity_and_fields() {
        let r = pending();
        let at = Utc::now();
        let p = r.to_published(at);
        assert_eq!(p.id, r.id);
        assert_eq!(p.author, r.author);
        assert_eq!(p.score, r.score);
        assert_eq!(p.body, r.body);
        assert_eq!(p.phone_id, r.phone_id);
        assert_eq!(p.phone_model, r.phone_model);
        assert_eq!(p.submitted_at, r.submitted_at);
        assert_eq!(p.posted_at, at);
    }
}
