use axum::{
    extract::{OriginalUri, Path, RawQuery, State},
    Json,
};

use crate::{
    db::{search_terms, ReviewFilter},
    error::{AppError, AppResult},
    models::{Page, PageRequest, Review, ReviewSortField, SortKey, SortOrder},
    routes::{params::QueryParams, AppState},
};

/// Lists all stored reviews, filtered by `place`, `rating`, `language` and `search`
pub async fn list_reviews(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    RawQuery(raw): RawQuery,
) -> AppResult<Json<Page<Review>>> {
    let params = QueryParams::parse(raw.as_deref());

    let mut filter = ReviewFilter {
        search_terms: search_terms(params.last("search")),
        language: params.text("language"),
        ..Default::default()
    };
    if let Some(place_id) = params.int("place")? {
        filter = filter.places(vec![place_id]);
    }
    if let Some(rating) = params.int("rating")? {
        let rating = i32::try_from(rating)
            .map_err(|_| AppError::InvalidInput("rating: Enter a whole number.".to_string()))?;
        filter.rating = Some(rating);
    }

    let order = SortOrder::parse(
        params.last("ordering"),
        SortKey::desc(ReviewSortField::CreatedAt),
    );
    let page = PageRequest::parse(params.last("page"), state.page_size)?;

    let reviews = state.reviews.list(&filter, &order, page).await?;
    Ok(Json(params.with_links(reviews, uri.path(), page)))
}

pub async fn retrieve_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Review>> {
    Ok(Json(state.reviews.get(id).await?))
}
