use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Paginated list envelope
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

/// A 1-based page number together with the page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn new(number: usize, size: usize) -> Self {
        Self { number, size }
    }

    /// Parses the `page` query parameter. Absent means the first page.
    pub fn parse(raw: Option<&str>, size: usize) -> AppResult<Self> {
        let number = match raw.map(str::trim) {
            None | Some("") => 1,
            Some(value) => match value.parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(invalid_page()),
            },
        };
        let page = Self::new(number, size);
        if page.checked_offset().is_none() {
            return Err(invalid_page());
        }
        Ok(page)
    }

    /// Row offset of the page, `None` when it does not fit a SQL `BIGINT`
    fn checked_offset(&self) -> Option<i64> {
        self.number
            .saturating_sub(1)
            .checked_mul(self.size)
            .and_then(|offset| i64::try_from(offset).ok())
    }

    pub fn offset(&self) -> usize {
        self.number.saturating_sub(1).saturating_mul(self.size)
    }

    pub fn limit(&self) -> usize {
        self.size
    }

    /// Rejects pages past the end. The first page always exists.
    pub fn validate(&self, count: i64) -> AppResult<()> {
        if self.number > 1 && self.checked_offset().map_or(true, |offset| offset >= count) {
            return Err(invalid_page());
        }
        Ok(())
    }

    pub fn has_next(&self, count: i64) -> bool {
        i64::try_from(self.offset().saturating_add(self.size)).map_or(false, |end| end < count)
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

fn invalid_page() -> AppError {
    AppError::NotFound("Invalid page.".to_string())
}
