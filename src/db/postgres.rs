use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};

use crate::{
    db::{PlaceFilter, ReviewFilter, Store},
    error::AppResult,
    models::{PageRequest, Place, PlaceSortField, Review, ReviewSortField, SortField, SortOrder},
};

const REVIEW_COLUMNS: &str = r#"
    SELECT r.id, r.place_id AS place, p.name AS place_name, r.google_review_id,
           r.author_name, r.rating, r.text, r.language, r.created_at, r.fetched_at
    FROM reviews r
    JOIN places p ON p.id = r.place_id
"#;

const PLACE_COLUMNS: &str = r#"
    SELECT p.id, p.name, p.google_place_id, p.address, p.city, p.latitude, p.longitude,
           p.rating, p.user_ratings_total, p.last_synced,
           (SELECT COUNT(*) FROM reviews r WHERE r.place_id = p.id) AS review_count
    FROM places p
"#;

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the schema in `migrations/`
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// `Store` backed by the `places` and `reviews` tables
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// ILIKE pattern matching `fragment` anywhere, with wildcards escaped
fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn push_review_where(qb: &mut QueryBuilder<'_, Postgres>, filter: &ReviewFilter) {
    qb.push(" WHERE TRUE");

    if let Some(place_ids) = &filter.place_ids {
        qb.push(" AND r.place_id = ANY(")
            .push_bind(place_ids.clone())
            .push(")");
    }
    if let Some(ids) = &filter.ids {
        qb.push(" AND r.id = ANY(").push_bind(ids.clone()).push(")");
    }
    if let Some(fragment) = &filter.text_contains {
        qb.push(" AND r.text ILIKE ").push_bind(like_pattern(fragment));
    }
    for term in &filter.search_terms {
        qb.push(" AND (r.text ILIKE ")
            .push_bind(like_pattern(term))
            .push(" OR r.author_name ILIKE ")
            .push_bind(like_pattern(term))
            .push(")");
    }
    if let Some(rating) = filter.rating {
        qb.push(" AND r.rating = ").push_bind(rating);
    }
    if let Some(language) = &filter.language {
        qb.push(" AND r.language = ").push_bind(language.clone());
    }
}

fn push_place_where(qb: &mut QueryBuilder<'_, Postgres>, filter: &PlaceFilter) {
    qb.push(" WHERE TRUE");

    for term in &filter.search_terms {
        qb.push(" AND (p.name ILIKE ")
            .push_bind(like_pattern(term))
            .push(" OR p.address ILIKE ")
            .push_bind(like_pattern(term))
            .push(")");
    }
    if let Some(city) = &filter.city {
        qb.push(" AND p.city = ").push_bind(city.clone());
    }
}

fn push_order_by<F: SortField>(
    qb: &mut QueryBuilder<'_, Postgres>,
    order: &SortOrder<F>,
    tie_break: &str,
) {
    qb.push(" ORDER BY ");
    for key in order.keys() {
        qb.push(key.field.column())
            .push(if key.descending { " DESC, " } else { " ASC, " });
    }
    qb.push(tie_break);
}

fn push_window(qb: &mut QueryBuilder<'_, Postgres>, window: PageRequest) {
    qb.push(" LIMIT ")
        .push_bind(i64::try_from(window.limit()).unwrap_or(i64::MAX))
        .push(" OFFSET ")
        .push_bind(i64::try_from(window.offset()).unwrap_or(i64::MAX));
}

#[async_trait::async_trait]
impl Store for PostgresStore {
    async fn place_ids_by_name(&self, fragment: &str) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM places WHERE name ILIKE $1 ORDER BY id")
            .bind(like_pattern(fragment))
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn place_names(&self) -> AppResult<Vec<(i64, String)>> {
        let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM places ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_places(&self, filter: &PlaceFilter) -> AppResult<i64> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM places p");
        push_place_where(&mut qb, filter);
        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn list_places(
        &self,
        filter: &PlaceFilter,
        order: &SortOrder<PlaceSortField>,
        window: PageRequest,
    ) -> AppResult<Vec<Place>> {
        let mut qb = QueryBuilder::new(PLACE_COLUMNS);
        push_place_where(&mut qb, filter);
        push_order_by(&mut qb, order, "p.id ASC");
        push_window(&mut qb, window);
        let places = qb.build_query_as::<Place>().fetch_all(&self.pool).await?;
        Ok(places)
    }

    async fn get_place(&self, id: i64) -> AppResult<Option<Place>> {
        let mut qb = QueryBuilder::new(PLACE_COLUMNS);
        qb.push(" WHERE p.id = ").push_bind(id);
        let place = qb
            .build_query_as::<Place>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(place)
    }

    async fn count_reviews(&self, filter: &ReviewFilter) -> AppResult<i64> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM reviews r");
        push_review_where(&mut qb, filter);
        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn list_reviews(
        &self,
        filter: &ReviewFilter,
        order: &SortOrder<ReviewSortField>,
        window: PageRequest,
    ) -> AppResult<Vec<Review>> {
        let mut qb = QueryBuilder::new(REVIEW_COLUMNS);
        push_review_where(&mut qb, filter);
        push_order_by(&mut qb, order, "r.id DESC");
        push_window(&mut qb, window);
        let reviews = qb.build_query_as::<Review>().fetch_all(&self.pool).await?;
        Ok(reviews)
    }

    async fn review_texts(
        &self,
        filter: &ReviewFilter,
        limit: usize,
    ) -> AppResult<Vec<(i64, String)>> {
        let mut qb = QueryBuilder::new("SELECT r.id, r.text FROM reviews r");
        push_review_where(&mut qb, filter);
        qb.push(" ORDER BY r.id ASC LIMIT ").push_bind(limit as i64);
        let rows = qb
            .build_query_as::<(i64, String)>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_review(&self, id: i64) -> AppResult<Option<Review>> {
        let mut qb = QueryBuilder::new(REVIEW_COLUMNS);
        qb.push(" WHERE r.id = ").push_bind(id);
        let review = qb
            .build_query_as::<Review>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
