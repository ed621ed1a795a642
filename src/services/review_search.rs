//! Keyword search over review text with optional place scoping
//!
//! Exact (case-insensitive substring) matching always wins. Only when it finds
//! nothing, and the query is long enough, does a conservative fuzzy pass look
//! for single-typo variants of the query among review tokens. Place-name
//! filters resolve the same way: substring first, similarity scoring second.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::instrument;

use crate::{
    db::{ReviewFilter, Store},
    error::AppResult,
    models::{Page, PageRequest, Review, ReviewSortField, SortOrder},
    services::matching::{normalize_text, similarity},
};

pub const PLACE_NAME_THRESHOLD: f64 = 0.6;
pub const PLACE_NAME_LIMIT: usize = 5;
pub const TOKEN_THRESHOLD: f64 = 0.9;
pub const TOKEN_LENGTH_TOLERANCE: usize = 1;
pub const MIN_TOKEN_LEN: usize = 3;
pub const MIN_FUZZY_QUERY_LEN: usize = 3;
pub const DEFAULT_FUZZY_SCAN_LIMIT: usize = 500;

/// Thresholds and bounds for the matcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    /// Minimum similarity for a place name to match a misspelled filter
    pub place_name_threshold: f64,
    /// Most places a single misspelled name filter may resolve to
    pub place_name_limit: usize,
    /// Minimum similarity between a review token and the query
    pub token_threshold: f64,
    /// Largest allowed length difference between token and query
    pub token_length_tolerance: usize,
    /// Tokens shorter than this are never compared
    pub min_token_len: usize,
    /// Queries shorter than this never use the fuzzy fallback
    pub min_fuzzy_query_len: usize,
    /// Most reviews the fuzzy fallback reads per request
    pub fuzzy_scan_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            place_name_threshold: PLACE_NAME_THRESHOLD,
            place_name_limit: PLACE_NAME_LIMIT,
            token_threshold: TOKEN_THRESHOLD,
            token_length_tolerance: TOKEN_LENGTH_TOLERANCE,
            min_token_len: MIN_TOKEN_LEN,
            min_fuzzy_query_len: MIN_FUZZY_QUERY_LEN,
            fuzzy_scan_limit: DEFAULT_FUZZY_SCAN_LIMIT,
        }
    }
}

impl SearchSettings {
    pub fn with_scan_limit(fuzzy_scan_limit: usize) -> Self {
        Self {
            fuzzy_scan_limit,
            ..Self::default()
        }
    }
}

/// Parsed search request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewSearch {
    pub query: Option<String>,
    pub place_ids: Vec<i64>,
    pub place_names: Vec<String>,
    /// Extra terms that must each appear in the text or author name
    pub search_terms: Vec<String>,
}

impl ReviewSearch {
    /// The keyword without surrounding whitespace, `None` when blank
    pub fn keyword(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
    }

    /// Keyword length in chars, as reported in logs
    pub fn keyword_len(&self) -> usize {
        self.keyword().map_or(0, |query| query.chars().count())
    }
}

#[derive(Clone)]
pub struct ReviewSearcher {
    store: Arc<dyn Store>,
    settings: SearchSettings,
}

impl ReviewSearcher {
    pub fn new(store: Arc<dyn Store>, settings: SearchSettings) -> Self {
        Self { store, settings }
    }

    /// Runs the search and returns one page of matching reviews
    pub async fn search(
        &self,
        request: &ReviewSearch,
        order: &SortOrder<ReviewSortField>,
        page: PageRequest,
    ) -> AppResult<Page<Review>> {
        let Some(filter) = self.select(request).await? else {
            page.validate(0)?;
            return Ok(Page::empty());
        };
        let filter = filter.search(request.search_terms.clone());

        let count = self.store.count_reviews(&filter).await?;
        page.validate(count)?;
        let results = self.store.list_reviews(&filter, order, page).await?;

        Ok(Page {
            count,
            next: None,
            previous: None,
            results,
        })
    }

    /// Resolves a request to the review selection it denotes
    ///
    /// `None` means the request can match nothing: blank query, or a place-name
    /// filter that resolved to no place.
    #[instrument(skip(self, request), fields(store = self.store.name()))]
    pub async fn select(&self, request: &ReviewSearch) -> AppResult<Option<ReviewFilter>> {
        let Some(query) = request.keyword() else {
            return Ok(None);
        };

        let mut target_places: BTreeSet<i64> = request.place_ids.iter().copied().collect();
        for name in &request.place_names {
            let resolved = self.resolve_place_name(name).await?;
            if resolved.is_empty() {
                tracing::debug!(name = %name, "Place name filter matched no place");
                return Ok(None);
            }
            target_places.extend(resolved);
        }

        let mut scope = ReviewFilter::default();
        if !target_places.is_empty() {
            scope = scope.places(target_places.into_iter().collect());
        }

        let exact = scope.clone().text_contains(query);
        let query_len = request.keyword_len();
        if query_len < self.settings.min_fuzzy_query_len
            || self.store.count_reviews(&exact).await? > 0
        {
            return Ok(Some(exact));
        }

        let fuzzy_ids = self.fuzzy_review_ids(&scope, query).await?;
        tracing::info!(
            query_len,
            accepted = fuzzy_ids.len(),
            "Substring search empty, used fuzzy fallback"
        );

        if fuzzy_ids.is_empty() {
            return Ok(Some(exact));
        }
        Ok(Some(scope.ids(fuzzy_ids)))
    }

    /// Ids of places a single `place_name` filter refers to
    ///
    /// Any place whose name contains `name` (case-insensitively) wins outright.
    /// Otherwise the most similar names above the threshold are used.
    pub async fn resolve_place_name(&self, name: &str) -> AppResult<Vec<i64>> {
        let direct = self.store.place_ids_by_name(name).await?;
        if !direct.is_empty() {
            return Ok(direct);
        }

        let wanted = normalize_text(name);
        let mut scored: Vec<(f64, i64)> = self
            .store
            .place_names()
            .await?
            .into_iter()
            .map(|(id, candidate)| (similarity(&wanted, &normalize_text(&candidate)), id))
            .filter(|(score, _)| *score >= self.settings.place_name_threshold)
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(self.settings.place_name_limit);

        tracing::debug!(
            name = %name,
            matched = scored.len(),
            "Resolved place name by similarity"
        );

        Ok(scored.into_iter().map(|(_, id)| id).collect())
    }

    /// Ids of in-scope reviews containing a token within one typo of `term`
    async fn fuzzy_review_ids(&self, scope: &ReviewFilter, term: &str) -> AppResult<Vec<i64>> {
        let wanted = normalize_text(term);
        let wanted_len = wanted.chars().count();

        let candidates = self
            .store
            .review_texts(scope, self.settings.fuzzy_scan_limit)
            .await?;

        let ids = candidates
            .into_iter()
            .filter(|(_, text)| self.has_near_token(&normalize_text(text), &wanted, wanted_len))
            .map(|(id, _)| id)
            .collect();

        Ok(ids)
    }

    fn has_near_token(&self, text: &str, wanted: &str, wanted_len: usize) -> bool {
        text.split_whitespace().any(|token| {
            let len = token.chars().count();
            len >= self.settings.min_token_len
                && len.abs_diff(wanted_len) <= self.settings.token_length_tolerance
                && similarity(wanted, token) >= self.settings.token_threshold
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, MockStore};
    use crate::models::{NewPlace, NewReview, Place};

    struct Fixture {
        store: MemoryStore,
        searcher: ReviewSearcher,
        api_place: Place,
        other_place: Place,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let api_place = store
            .insert_place(NewPlace::new("API Place", "api-123").address("100 API Ave"))
            .await
            .unwrap();
        let other_place = store
            .insert_place(NewPlace::new("Canyon Coffee", "other-456").address("300 API Ave"))
            .await
            .unwrap();
        let searcher = ReviewSearcher::new(Arc::new(store.clone()), SearchSettings::default());
        Fixture {
            store,
            searcher,
            api_place,
            other_place,
        }
    }

    async fn add_review(store: &MemoryStore, place: &Place, google_id: &str, text: &str) -> Review {
        store
            .insert_review(NewReview::new(place.id, google_id, 5, text).author("Alice"))
            .await
            .unwrap()
    }

    fn query(q: &str) -> ReviewSearch {
        ReviewSearch {
            query: Some(q.to_string()),
            ..Default::default()
        }
    }

    async fn run(searcher: &ReviewSearcher, request: &ReviewSearch) -> Vec<Review> {
        searcher
            .search(request, &SortOrder::default(), PageRequest::new(1, 50))
            .await
            .unwrap()
            .results
    }

    #[tokio::test]
    async fn test_blank_or_missing_query_selects_nothing() {
        let f = fixture().await;
        add_review(&f.store, &f.api_place, "rev-1", "Some text").await;

        assert!(f.searcher.select(&ReviewSearch::default()).await.unwrap().is_none());
        assert!(f.searcher.select(&query("")).await.unwrap().is_none());
        assert!(f.searcher.select(&query("   ")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_substring_match_returns_all_verbatim_hits() {
        let f = fixture().await;
        add_review(&f.store, &f.api_place, "rev-1", "Loved the latte here!").await;
        add_review(&f.store, &f.other_place, "rev-2", "LATTE over here too").await;
        add_review(&f.store, &f.other_place, "rev-3", "Great burger spot.").await;

        let results = run(&f.searcher, &query("latte")).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.text.to_lowercase().contains("latte")));
    }

    #[tokio::test]
    async fn test_short_query_never_goes_fuzzy() {
        let f = fixture().await;
        add_review(&f.store, &f.api_place, "rev-1", "ok la").await;

        let filter = f.searcher.select(&query("lx")).await.unwrap().unwrap();
        assert_eq!(filter.ids, None);
        assert!(run(&f.searcher, &query("lx")).await.is_empty());
    }

    #[tokio::test]
    async fn test_fuzzy_accepts_single_typo() {
        let f = fixture().await;
        let hit = add_review(&f.store, &f.api_place, "rev-7", "Amazing latte here.").await;
        add_review(&f.store, &f.api_place, "rev-8", "Great brunch.").await;

        let results = run(&f.searcher, &query("lattle")).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, hit.id);
    }

    #[tokio::test]
    async fn test_fuzzy_rejects_unrelated_words() {
        let f = fixture().await;
        add_review(&f.store, &f.api_place, "rev-7b", "Great croissant here.").await;

        assert!(run(&f.searcher, &query("latte")).await.is_empty());
    }

    #[tokio::test]
    async fn test_fuzzy_respects_place_scope() {
        let f = fixture().await;
        add_review(&f.store, &f.api_place, "rev-1", "Amazing latte here.").await;
        add_review(&f.store, &f.other_place, "rev-2", "Amazing latte there.").await;

        let request = ReviewSearch {
            place_ids: vec![f.other_place.id],
            ..query("lattle")
        };
        let results = run(&f.searcher, &request).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].place, f.other_place.id);
    }

    #[tokio::test]
    async fn test_fuzzy_scan_is_bounded() {
        let store = MemoryStore::new();
        let place = store.insert_place(NewPlace::new("API Place", "api-123")).await.unwrap();
        add_review(&store, &place, "rev-1", "Nothing relevant").await;
        add_review(&store, &place, "rev-2", "Amazing latte here.").await;

        let searcher = ReviewSearcher::new(Arc::new(store), SearchSettings::with_scan_limit(1));
        assert!(run(&searcher, &query("lattle")).await.is_empty());
    }

    #[tokio::test]
    async fn test_place_ids_union() {
        let f = fixture().await;
        let third = f
            .store
            .insert_place(NewPlace::new("Third Place", "third-123"))
            .await
            .unwrap();
        add_review(&f.store, &f.api_place, "rev-3", "Loved the latte here!").await;
        add_review(&f.store, &f.other_place, "rev-4", "Loved the latte here too").await;
        add_review(&f.store, &third, "rev-4b", "No latte mention here").await;

        let request = ReviewSearch {
            place_ids: vec![f.api_place.id, f.other_place.id],
            ..query("latte")
        };
        let places: BTreeSet<i64> = run(&f.searcher, &request).await.iter().map(|r| r.place).collect();
        assert_eq!(places, BTreeSet::from([f.api_place.id, f.other_place.id]));
    }

    #[tokio::test]
    async fn test_place_name_substring_match() {
        let f = fixture().await;
        assert_eq!(
            f.searcher.resolve_place_name("api place").await.unwrap(),
            vec![f.api_place.id]
        );
        assert_eq!(
            f.searcher.resolve_place_name("coffee").await.unwrap(),
            vec![f.other_place.id]
        );
    }

    #[tokio::test]
    async fn test_place_name_fuzzy_match() {
        let f = fixture().await;
        add_review(&f.store, &f.api_place, "rev-8", "Great brunch.").await;

        let request = ReviewSearch {
            place_names: vec!["Api Plaec".to_string()],
            ..query("brunch")
        };
        let results = run(&f.searcher, &request).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].place, f.api_place.id);
    }

    #[tokio::test]
    async fn test_place_name_fuzzy_keeps_top_five_by_score() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        let names = [
            "Cafe Alpha",
            "Cafe Alphb",
            "Cafe Alphc",
            "Cafe Alphd",
            "Cafe Alphe",
            "Cafe Alphf",
            "Cafe Alpha Beta",
        ];
        for (i, name) in names.iter().enumerate() {
            let place = store
                .insert_place(NewPlace::new(*name, format!("g-{i}")))
                .await
                .unwrap();
            ids.push(place.id);
        }
        let searcher = ReviewSearcher::new(Arc::new(store), SearchSettings::default());

        let resolved = searcher.resolve_place_name("Cafe Alphz").await.unwrap();
        assert_eq!(resolved.len(), PLACE_NAME_LIMIT);
        // Equal scores keep insertion order; the longer name scores lower
        assert_eq!(resolved, ids[..5].to_vec());
    }

    #[tokio::test]
    async fn test_unresolved_place_name_short_circuits() {
        let f = fixture().await;
        add_review(&f.store, &f.api_place, "rev-1", "Loved the latte here!").await;

        let request = ReviewSearch {
            place_ids: vec![f.api_place.id],
            place_names: vec!["Zzyzx Grill".to_string()],
            ..query("latte")
        };
        assert!(f.searcher.select(&request).await.unwrap().is_none());
        assert!(run(&f.searcher, &request).await.is_empty());
    }

    #[tokio::test]
    async fn test_one_unresolved_place_name_among_several_short_circuits() {
        let f = fixture().await;
        add_review(&f.store, &f.api_place, "rev-1", "Loved the latte here!").await;

        let request = ReviewSearch {
            place_names: vec!["API Place".to_string(), "Zzyzx Grill".to_string()],
            ..query("latte")
        };
        assert!(f.searcher.select(&request).await.unwrap().is_none());
        assert!(run(&f.searcher, &request).await.is_empty());
    }

    #[tokio::test]
    async fn test_surrounding_whitespace_in_query_is_ignored() {
        let f = fixture().await;
        let hit = add_review(&f.store, &f.api_place, "rev-1", "Latte was great").await;

        let filter = f.searcher.select(&query("  latte ")).await.unwrap().unwrap();
        assert_eq!(filter.text_contains.as_deref(), Some("latte"));
        let results = run(&f.searcher, &query(" latte")).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, hit.id);
    }

    #[test]
    fn test_keyword_len_counts_trimmed_chars() {
        assert_eq!(query(" café ").keyword(), Some("café"));
        assert_eq!(query(" café ").keyword_len(), 4);
        assert_eq!(query("   ").keyword(), None);
        assert_eq!(ReviewSearch::default().keyword_len(), 0);
    }

    #[tokio::test]
    async fn test_search_terms_narrow_results() {
        let f = fixture().await;
        add_review(&f.store, &f.api_place, "rev-1", "Loved the latte here!").await;
        f.store
            .insert_review(NewReview::new(f.other_place.id, "rev-2", 4, "Latte was fine").author("Bob"))
            .await
            .unwrap();

        let request = ReviewSearch {
            search_terms: vec!["bob".to_string()],
            ..query("latte")
        };
        let results = run(&f.searcher, &request).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].author_name, "Bob");
    }

    #[tokio::test]
    async fn test_substring_hit_skips_fuzzy_scan() {
        let mut store = MockStore::new();
        store.expect_name().return_const("mock");
        store.expect_count_reviews().times(1).returning(|_| Ok(3));
        store.expect_review_texts().never();
        store.expect_place_ids_by_name().never();

        let searcher = ReviewSearcher::new(Arc::new(store), SearchSettings::default());
        let filter = searcher.select(&query("latte")).await.unwrap().unwrap();
        assert_eq!(filter.text_contains.as_deref(), Some("latte"));
        assert_eq!(filter.place_ids, None);
    }

    #[tokio::test]
    async fn test_fuzzy_scan_uses_configured_limit() {
        let mut store = MockStore::new();
        store.expect_name().return_const("mock");
        store.expect_count_reviews().returning(|_| Ok(0));
        store
            .expect_review_texts()
            .withf(|filter, limit| filter.text_contains.is_none() && *limit == 25)
            .times(1)
            .returning(|_, _| Ok(vec![(7, "Amazing latte here.".to_string())]));

        let searcher = ReviewSearcher::new(Arc::new(store), SearchSettings::with_scan_limit(25));
        let filter = searcher.select(&query("lattle")).await.unwrap().unwrap();
        assert_eq!(filter.ids, Some(vec![7]));
    }
}
