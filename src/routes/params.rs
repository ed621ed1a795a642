use url::form_urlencoded;

use crate::{
    error::{AppError, AppResult},
    models::{Page, PageRequest},
};

/// Decoded query string that keeps repeated keys
///
/// Single-valued lookups take the last occurrence. Multi-valued lookups accept
/// repeated keys, comma-joined values, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|raw| form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self { pairs }
    }

    pub fn last(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every non-blank value of `key`, splitting comma-joined values
    pub fn multi(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Like `multi`, silently dropping values that are not integers
    pub fn multi_ids(&self, key: &str) -> Vec<i64> {
        self.multi(key)
            .iter()
            .filter_map(|v| v.parse().ok())
            .collect()
    }

    /// Strict integer filter: blank is absent, anything else must parse
    pub fn int(&self, key: &str) -> AppResult<Option<i64>> {
        match self.last(key).map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| AppError::InvalidInput(format!("{key}: Enter a whole number."))),
        }
    }

    /// Non-blank single value
    pub fn text(&self, key: &str) -> Option<String> {
        self.last(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// `path` with this query string, `page` replaced by `number`
    ///
    /// Page 1 drops the parameter entirely.
    pub fn page_link(&self, path: &str, number: usize) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in self.pairs.iter().filter(|(k, _)| k != "page") {
            serializer.append_pair(k, v);
        }
        if number > 1 {
            serializer.append_pair("page", &number.to_string());
        }
        let query = serializer.finish();

        if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        }
    }

    /// Fills in `next` and `previous` for a page served at `path`
    pub fn with_links<T>(&self, mut page: Page<T>, path: &str, request: PageRequest) -> Page<T> {
        page.next = request
            .has_next(page.count)
            .then(|| self.page_link(path, request.number + 1));
        page.previous = request
            .has_previous()
            .then(|| self.page_link(path, request.number - 1));
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_and_comma_joined_values() {
        let params = QueryParams::parse(Some("place=1,2&place=3&place=abc&place=&place_name=API%20Place,Jam!"));
        assert_eq!(params.multi_ids("place"), vec![1, 2, 3]);
        assert_eq!(params.multi("place_name"), vec!["API Place", "Jam!"]);
        assert!(params.multi("missing").is_empty());
    }

    #[test]
    fn test_last_value_wins_for_single_lookups() {
        let params = QueryParams::parse(Some("q=first&q=second+word"));
        assert_eq!(params.last("q"), Some("second word"));
        assert_eq!(QueryParams::parse(None).last("q"), None);
    }

    #[test]
    fn test_strict_integers() {
        let params = QueryParams::parse(Some("rating=5&place=x&language="));
        assert_eq!(params.int("rating").unwrap(), Some(5));
        assert!(params.int("place").is_err());
        assert_eq!(params.int("missing").unwrap(), None);
        assert_eq!(params.text("language"), None);
    }

    #[test]
    fn test_page_links() {
        let params = QueryParams::parse(Some("q=latte&page=2"));
        assert_eq!(params.page_link("/api/reviews/search/", 3), "/api/reviews/search/?q=latte&page=3");
        assert_eq!(params.page_link("/api/reviews/search/", 1), "/api/reviews/search/?q=latte");
        assert_eq!(QueryParams::default().page_link("/api/places/", 1), "/api/places/");
    }

    #[test]
    fn test_with_links_sets_neighbours() {
        let params = QueryParams::parse(Some("page=2"));
        let page = Page {
            count: 5,
            next: None,
            previous: None,
            results: vec![3, 4],
        };
        let page = params.with_links(page, "/api/places/", PageRequest::new(2, 2));
        assert_eq!(page.next.as_deref(), Some("/api/places/?page=3"));
        assert_eq!(page.previous.as_deref(), Some("/api/places/"));
    }
}
