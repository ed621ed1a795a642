use std::sync::Arc;

use axum::{
    http::{Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    db::Store,
    middleware::{make_span_with_request_id, request_id_middleware, require_admin},
    services::{PlaceDirectory, ReviewCatalog, ReviewSearcher, SearchSettings},
};

pub mod internal;
pub mod params;
pub mod places;
pub mod reviews;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub searcher: ReviewSearcher,
    pub places: PlaceDirectory,
    pub reviews: ReviewCatalog,
    pub page_size: usize,
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        settings: SearchSettings,
        page_size: usize,
        admin_token: Option<String>,
    ) -> Self {
        Self {
            searcher: ReviewSearcher::new(store.clone(), settings),
            places: PlaceDirectory::new(store.clone()),
            reviews: ReviewCatalog::new(store),
            page_size,
            admin_token: admin_token.map(Arc::from),
        }
    }

    pub fn from_config(store: Arc<dyn Store>, config: &Config) -> Self {
        Self::new(
            store,
            SearchSettings::with_scan_limit(config.fuzzy_scan_limit),
            config.page_size,
            config.admin_token.clone(),
        )
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .nest("/internal", internal_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(cors),
        )
        .with_state(state)
}

/// Public API routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/places/", get(places::list))
        .route("/places/:id/", get(places::retrieve))
        .route("/reviews/search/", get(reviews::search))
        // Path used by the web frontend
        .route("/search/reviews/", get(reviews::search))
}

/// Admin-only routes under /internal
fn internal_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/reviews/", get(internal::list_reviews))
        .route("/reviews/:id/", get(internal::retrieve_review))
        .route_layer(from_fn_with_state(state, require_admin))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
