use std::sync::Arc;

use crate::{
    db::{ReviewFilter, Store},
    error::{AppError, AppResult},
    models::{Page, PageRequest, Review, ReviewSortField, SortOrder},
};

/// Unrestricted review listing for operators
#[derive(Clone)]
pub struct ReviewCatalog {
    store: Arc<dyn Store>,
}

impl ReviewCatalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        filter: &ReviewFilter,
        order: &SortOrder<ReviewSortField>,
        page: PageRequest,
    ) -> AppResult<Page<Review>> {
        let count = self.store.count_reviews(filter).await?;
        page.validate(count)?;
        let results = self.store.list_reviews(filter, order, page).await?;

        Ok(Page {
            count,
            next: None,
            previous: None,
            results,
        })
    }

    pub async fn get(&self, id: i64) -> AppResult<Review> {
        self.store
            .get_review(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Not found.".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockStore;

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut store = MockStore::new();
        store
            .expect_count_reviews()
            .returning(|_| Err(AppError::Database(sqlx::Error::PoolTimedOut)));
        store.expect_list_reviews().never();

        let catalog = ReviewCatalog::new(Arc::new(store));
        let result = catalog
            .list(&ReviewFilter::default(), &SortOrder::default(), PageRequest::new(1, 20))
            .await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_missing_review_is_not_found() {
        let mut store = MockStore::new();
        store.expect_get_review().returning(|_| Ok(None));

        let catalog = ReviewCatalog::new(Arc::new(store));
        assert!(matches!(catalog.get(1).await, Err(AppError::NotFound(_))));
    }
}
