use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A restaurant or cafe synced from Google Places, as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub google_place_id: String,
    pub address: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<i32>,
    pub last_synced: Option<DateTime<Utc>>,
    /// Number of stored reviews for this place
    pub review_count: i64,
}

/// Fields needed to store a new place
#[derive(Debug, Clone)]
pub struct NewPlace {
    pub name: String,
    pub google_place_id: String,
    pub address: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<i32>,
    pub last_synced: Option<DateTime<Utc>>,
}

impl NewPlace {
    pub const DEFAULT_CITY: &'static str = "Bozeman";

    pub fn new(name: impl Into<String>, google_place_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            google_place_id: google_place_id.into(),
            address: String::new(),
            city: Self::DEFAULT_CITY.to_string(),
            latitude: None,
            longitude: None,
            rating: None,
            user_ratings_total: None,
            last_synced: None,
        }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn rating(mut self, rating: f64, user_ratings_total: i32) -> Self {
        self.rating = Some(rating);
        self.user_ratings_total = Some(user_ratings_total);
        self
    }
}
