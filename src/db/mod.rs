//! Storage abstraction for places and reviews
//!
//! The HTTP layer and the search services only talk to `Store`. PostgreSQL is the
//! production backend; the in-memory backend serves tests and local demos.

use crate::{
    error::AppResult,
    models::{PageRequest, Place, PlaceSortField, Review, ReviewSortField, SortOrder},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, run_migrations, PostgresStore};

/// Selection of reviews. Every populated field narrows the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewFilter {
    /// Only reviews of these places. `None` means any place.
    pub place_ids: Option<Vec<i64>>,
    /// Only reviews with these ids. `None` means any id.
    pub ids: Option<Vec<i64>>,
    /// Case-insensitive substring of the review text
    pub text_contains: Option<String>,
    /// Each term must appear case-insensitively in the text or author name
    pub search_terms: Vec<String>,
    pub rating: Option<i32>,
    pub language: Option<String>,
}

impl ReviewFilter {
    pub fn places(mut self, place_ids: Vec<i64>) -> Self {
        self.place_ids = Some(place_ids);
        self
    }

    pub fn ids(mut self, ids: Vec<i64>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn text_contains(mut self, fragment: impl Into<String>) -> Self {
        self.text_contains = Some(fragment.into());
        self
    }

    pub fn search(mut self, terms: Vec<String>) -> Self {
        self.search_terms = terms;
        self
    }

    /// Tests a review against everything but `place_ids` and `ids`
    pub fn matches_text(&self, text: &str, author_name: &str) -> bool {
        if let Some(fragment) = &self.text_contains {
            if !contains_ignore_case(text, fragment) {
                return false;
            }
        }
        self.search_terms.iter().all(|term| {
            contains_ignore_case(text, term) || contains_ignore_case(author_name, term)
        })
    }
}

/// Selection of places
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceFilter {
    /// Each term must appear case-insensitively in the name or address
    pub search_terms: Vec<String>,
    /// Exact city match
    pub city: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Ids of places whose name contains `fragment`, case-insensitively
    async fn place_ids_by_name(&self, fragment: &str) -> AppResult<Vec<i64>>;

    /// `(id, name)` of every place, for similarity scoring
    async fn place_names(&self) -> AppResult<Vec<(i64, String)>>;

    async fn count_places(&self, filter: &PlaceFilter) -> AppResult<i64>;

    async fn list_places(
        &self,
        filter: &PlaceFilter,
        order: &SortOrder<PlaceSortField>,
        window: PageRequest,
    ) -> AppResult<Vec<Place>>;

    async fn get_place(&self, id: i64) -> AppResult<Option<Place>>;

    async fn count_reviews(&self, filter: &ReviewFilter) -> AppResult<i64>;

    async fn list_reviews(
        &self,
        filter: &ReviewFilter,
        order: &SortOrder<ReviewSortField>,
        window: PageRequest,
    ) -> AppResult<Vec<Review>>;

    /// `(id, text)` of at most `limit` matching reviews in ascending id order
    async fn review_texts(&self, filter: &ReviewFilter, limit: usize)
        -> AppResult<Vec<(i64, String)>>;

    async fn get_review(&self, id: i64) -> AppResult<Option<Review>>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Splits a free-text `search` parameter into terms
pub fn search_terms(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}
