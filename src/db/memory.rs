use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    db::{contains_ignore_case, PlaceFilter, ReviewFilter, Store},
    error::{AppError, AppResult},
    models::{
        NewPlace, NewReview, PageRequest, Place, PlaceSortField, Review, ReviewSortField,
        SortOrder,
    },
};

/// `Store` held entirely in memory
///
/// Mirrors the PostgreSQL backend's semantics: cascading ownership of reviews by
/// places, unique Google ids, NULLs sorting last ascending and first descending.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    places: BTreeMap<i64, Place>,
    reviews: BTreeMap<i64, Review>,
    next_place_id: i64,
    next_review_id: i64,
}

impl MemoryStoreInner {
    fn review_count(&self, place_id: i64) -> i64 {
        self.reviews
            .values()
            .filter(|review| review.place == place_id)
            .count() as i64
    }

    fn place_with_count(&self, place: &Place) -> Place {
        Place {
            review_count: self.review_count(place.id),
            ..place.clone()
        }
    }

    /// Refreshes the joined place name
    fn joined(&self, review: &Review) -> Review {
        let place_name = self
            .places
            .get(&review.place)
            .map(|place| place.name.clone())
            .unwrap_or_default();
        Review {
            place_name,
            ..review.clone()
        }
    }

    fn matching_reviews<'a>(
        &'a self,
        filter: &'a ReviewFilter,
    ) -> impl Iterator<Item = &'a Review> + 'a {
        self.reviews
            .values()
            .filter(move |review| review_matches(review, filter))
    }

    fn matching_places<'a>(&'a self, filter: &'a PlaceFilter) -> impl Iterator<Item = &'a Place> + 'a {
        self.places
            .values()
            .filter(move |place| place_matches(place, filter))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_place(&self, new: NewPlace) -> AppResult<Place> {
        let mut inner = self.inner.write().await;

        if inner
            .places
            .values()
            .any(|place| place.google_place_id == new.google_place_id)
        {
            return Err(AppError::InvalidInput(format!(
                "Duplicate google_place_id: {}",
                new.google_place_id
            )));
        }

        inner.next_place_id += 1;
        let place = Place {
            id: inner.next_place_id,
            name: new.name,
            google_place_id: new.google_place_id,
            address: new.address,
            city: new.city,
            latitude: new.latitude,
            longitude: new.longitude,
            rating: new.rating,
            user_ratings_total: new.user_ratings_total,
            last_synced: new.last_synced,
            review_count: 0,
        };
        inner.places.insert(place.id, place.clone());

        Ok(place)
    }

    pub async fn insert_review(&self, new: NewReview) -> AppResult<Review> {
        let mut inner = self.inner.write().await;

        let place_name = match inner.places.get(&new.place_id) {
            Some(place) => place.name.clone(),
            None => return Err(AppError::NotFound(format!("Place {} not found", new.place_id))),
        };
        if inner
            .reviews
            .values()
            .any(|review| review.google_review_id == new.google_review_id)
        {
            return Err(AppError::InvalidInput(format!(
                "Duplicate google_review_id: {}",
                new.google_review_id
            )));
        }

        inner.next_review_id += 1;
        let review = Review {
            id: inner.next_review_id,
            place: new.place_id,
            place_name,
            google_review_id: new.google_review_id,
            author_name: new.author_name,
            rating: new.rating,
            text: new.text,
            language: new.language,
            created_at: new.created_at,
            fetched_at: Utc::now(),
        };
        inner.reviews.insert(review.id, review.clone());

        Ok(review)
    }

    /// Removes a place together with its reviews
    pub async fn delete_place(&self, id: i64) -> bool {
        let mut inner = self.inner.write().await;
        inner.reviews.retain(|_, review| review.place != id);
        inner.places.remove(&id).is_some()
    }
}

fn review_matches(review: &Review, filter: &ReviewFilter) -> bool {
    if let Some(place_ids) = &filter.place_ids {
        if !place_ids.contains(&review.place) {
            return false;
        }
    }
    if let Some(ids) = &filter.ids {
        if !ids.contains(&review.id) {
            return false;
        }
    }
    if let Some(rating) = filter.rating {
        if review.rating != rating {
            return false;
        }
    }
    if let Some(language) = &filter.language {
        if &review.language != language {
            return false;
        }
    }
    filter.matches_text(&review.text, &review.author_name)
}

fn place_matches(place: &Place, filter: &PlaceFilter) -> bool {
    if let Some(city) = &filter.city {
        if &place.city != city {
            return false;
        }
    }
    filter.search_terms.iter().all(|term| {
        contains_ignore_case(&place.name, term) || contains_ignore_case(&place.address, term)
    })
}

/// NULLs compare greater than any value, as in PostgreSQL
fn compare_optional<T: PartialOrd>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_reviews(a: &Review, b: &Review, order: &SortOrder<ReviewSortField>) -> Ordering {
    order
        .keys()
        .iter()
        .map(|key| {
            let ordering = match key.field {
                ReviewSortField::CreatedAt => a.created_at.cmp(&b.created_at),
                ReviewSortField::Rating => a.rating.cmp(&b.rating),
            };
            if key.descending {
                ordering.reverse()
            } else {
                ordering
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| b.id.cmp(&a.id))
}

fn compare_places(a: &Place, b: &Place, order: &SortOrder<PlaceSortField>) -> Ordering {
    order
        .keys()
        .iter()
        .map(|key| {
            let ordering = match key.field {
                PlaceSortField::Name => a.name.cmp(&b.name),
                PlaceSortField::Rating => compare_optional(&a.rating, &b.rating),
                PlaceSortField::UserRatingsTotal => {
                    compare_optional(&a.user_ratings_total, &b.user_ratings_total)
                }
            };
            if key.descending {
                ordering.reverse()
            } else {
                ordering
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| a.id.cmp(&b.id))
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn place_ids_by_name(&self, fragment: &str) -> AppResult<Vec<i64>> {
        let inner = self.inner.read().await;
        Ok(inner
            .places
            .values()
            .filter(|place| contains_ignore_case(&place.name, fragment))
            .map(|place| place.id)
            .collect())
    }

    async fn place_names(&self) -> AppResult<Vec<(i64, String)>> {
        let inner = self.inner.read().await;
        Ok(inner
            .places
            .values()
            .map(|place| (place.id, place.name.clone()))
            .collect())
    }

    async fn count_places(&self, filter: &PlaceFilter) -> AppResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner.matching_places(filter).count() as i64)
    }

    async fn list_places(
        &self,
        filter: &PlaceFilter,
        order: &SortOrder<PlaceSortField>,
        window: PageRequest,
    ) -> AppResult<Vec<Place>> {
        let inner = self.inner.read().await;
        let mut places: Vec<Place> = inner
            .matching_places(filter)
            .map(|place| inner.place_with_count(place))
            .collect();
        places.sort_by(|a, b| compare_places(a, b, order));
        Ok(places
            .into_iter()
            .skip(window.offset())
            .take(window.limit())
            .collect())
    }

    async fn get_place(&self, id: i64) -> AppResult<Option<Place>> {
        let inner = self.inner.read().await;
        Ok(inner.places.get(&id).map(|place| inner.place_with_count(place)))
    }

    async fn count_reviews(&self, filter: &ReviewFilter) -> AppResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner.matching_reviews(filter).count() as i64)
    }

    async fn list_reviews(
        &self,
        filter: &ReviewFilter,
        order: &SortOrder<ReviewSortField>,
        window: PageRequest,
    ) -> AppResult<Vec<Review>> {
        let inner = self.inner.read().await;
        let mut reviews: Vec<Review> = inner
            .matching_reviews(filter)
            .map(|review| inner.joined(review))
            .collect();
        reviews.sort_by(|a, b| compare_reviews(a, b, order));
        Ok(reviews
            .into_iter()
            .skip(window.offset())
            .take(window.limit())
            .collect())
    }

    async fn review_texts(
        &self,
        filter: &ReviewFilter,
        limit: usize,
    ) -> AppResult<Vec<(i64, String)>> {
        let inner = self.inner.read().await;
        Ok(inner
            .matching_reviews(filter)
            .take(limit)
            .map(|review| (review.id, review.text.clone()))
            .collect())
    }

    async fn get_review(&self, id: i64) -> AppResult<Option<Review>> {
        let inner = self.inner.read().await;
        Ok(inner.reviews.get(&id).map(|review| inner.joined(review)))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
