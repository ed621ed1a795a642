use axum::{
    extract::{OriginalUri, Path, RawQuery, State},
    Json,
};

use crate::{
    db::{search_terms, PlaceFilter},
    error::AppResult,
    models::{Page, PageRequest, Place, PlaceSortField, SortKey, SortOrder},
    routes::{params::QueryParams, AppState},
};

/// Lists places, filtered by `search` and `city`, sorted by `ordering`
pub async fn list(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    RawQuery(raw): RawQuery,
) -> AppResult<Json<Page<Place>>> {
    let params = QueryParams::parse(raw.as_deref());

    let filter = PlaceFilter {
        search_terms: search_terms(params.last("search")),
        city: params.text("city"),
    };
    let order = SortOrder::parse(params.last("ordering"), SortKey::asc(PlaceSortField::Name));
    let page = PageRequest::parse(params.last("page"), state.page_size)?;

    let places = state.places.list(&filter, &order, page).await?;
    Ok(Json(params.with_links(places, uri.path(), page)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Place>> {
    Ok(Json(state.places.get(id).await?))
}
