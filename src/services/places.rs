use std::sync::Arc;

use crate::{
    db::{PlaceFilter, Store},
    error::{AppError, AppResult},
    models::{Page, PageRequest, Place, PlaceSortField, SortOrder},
};

/// Public, read-only access to places
#[derive(Clone)]
pub struct PlaceDirectory {
    store: Arc<dyn Store>,
}

impl PlaceDirectory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        filter: &PlaceFilter,
        order: &SortOrder<PlaceSortField>,
        page: PageRequest,
    ) -> AppResult<Page<Place>> {
        let count = self.store.count_places(filter).await?;
        page.validate(count)?;
        let results = self.store.list_places(filter, order, page).await?;

        Ok(Page {
            count,
            next: None,
            previous: None,
            results,
        })
    }

    pub async fn get(&self, id: i64) -> AppResult<Place> {
        self.store
            .get_place(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Not found.".to_string()))
    }
}
