use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Google review of a place, joined with the place's display name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    /// Owning place id
    pub place: i64,
    pub place_name: String,
    pub google_review_id: String,
    pub author_name: String,
    pub rating: i32,
    pub text: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
}

/// Fields needed to store a new review
#[derive(Debug, Clone)]
pub struct NewReview {
    pub place_id: i64,
    pub google_review_id: String,
    pub author_name: String,
    pub rating: i32,
    pub text: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

impl NewReview {
    pub const DEFAULT_LANGUAGE: &'static str = "en";

    pub fn new(
        place_id: i64,
        google_review_id: impl Into<String>,
        rating: i32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            place_id,
            google_review_id: google_review_id.into(),
            author_name: String::new(),
            rating,
            text: text.into(),
            language: Self::DEFAULT_LANGUAGE.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn author(mut self, author_name: impl Into<String>) -> Self {
        self.author_name = author_name.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}
