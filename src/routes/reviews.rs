use axum::{
    extract::{OriginalUri, RawQuery, State},
    Extension, Json,
};

use crate::{
    db::search_terms,
    error::AppResult,
    middleware::RequestId,
    models::{Page, PageRequest, Review, ReviewSortField, SortKey, SortOrder},
    routes::{params::QueryParams, AppState},
    services::ReviewSearch,
};

/// Public keyword search over reviews
///
/// `q` is the keyword. `place` (ids) and `place_name` scope the search and may
/// repeat or be comma-joined; non-numeric `place` values are dropped.
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    OriginalUri(uri): OriginalUri,
    RawQuery(raw): RawQuery,
) -> AppResult<Json<Page<Review>>> {
    let params = QueryParams::parse(raw.as_deref());

    let request = ReviewSearch {
        query: params.last("q").map(str::to_string),
        place_ids: params.multi_ids("place"),
        place_names: params.multi("place_name"),
        search_terms: search_terms(params.last("search")),
    };
    let order = SortOrder::parse(
        params.last("ordering"),
        SortKey::desc(ReviewSortField::CreatedAt),
    );
    let page = PageRequest::parse(params.last("page"), state.page_size)?;

    tracing::info!(
        request_id = %request_id,
        query_len = request.keyword_len(),
        place_ids = request.place_ids.len(),
        place_names = request.place_names.len(),
        "Processing review search"
    );

    let reviews = state.searcher.search(&request, &order, page).await?;

    tracing::info!(
        request_id = %request_id,
        count = reviews.count,
        "Review search completed"
    );

    Ok(Json(params.with_links(reviews, uri.path(), page)))
}
