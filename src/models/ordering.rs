//! Client-selectable sort orders for list endpoints.
//!
//! The `ordering` query parameter takes comma-separated field names, each
//! optionally prefixed with `-` for descending order. Unknown fields are
//! dropped; when nothing valid remains the endpoint's default applies.

/// A field a list endpoint may be sorted by
pub trait SortField: Copy + Eq + std::fmt::Debug {
    /// Parses the public field name used in `ordering`
    fn parse(name: &str) -> Option<Self>;

    /// SQL column expression for this field
    fn column(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSortField {
    CreatedAt,
    Rating,
}

impl SortField for ReviewSortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "created_at" => Some(Self::CreatedAt),
            "rating" => Some(Self::Rating),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "r.created_at",
            Self::Rating => "r.rating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceSortField {
    Name,
    Rating,
    UserRatingsTotal,
}

impl SortField for PlaceSortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "rating" => Some(Self::Rating),
            "user_ratings_total" => Some(Self::UserRatingsTotal),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::Name => "p.name",
            Self::Rating => "p.rating",
            Self::UserRatingsTotal => "p.user_ratings_total",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey<F> {
    pub field: F,
    pub descending: bool,
}

impl<F> SortKey<F> {
    pub fn asc(field: F) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub fn desc(field: F) -> Self {
        Self {
            field,
            descending: true,
        }
    }
}

/// Ordered list of sort keys, never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder<F>(Vec<SortKey<F>>);

impl<F: SortField> SortOrder<F> {
    pub fn new(default: SortKey<F>) -> Self {
        Self(vec![default])
    }

    /// Parses an `ordering` parameter, falling back to `default`
    pub fn parse(raw: Option<&str>, default: SortKey<F>) -> Self {
        let keys: Vec<SortKey<F>> = raw
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter_map(|term| {
                let (name, descending) = match term.strip_prefix('-') {
                    Some(name) => (name, true),
                    None => (term, false),
                };
                F::parse(name).map(|field| SortKey { field, descending })
            })
            .collect();

        if keys.is_empty() {
            Self::new(default)
        } else {
            Self(keys)
        }
    }

    pub fn keys(&self) -> &[SortKey<F>] {
        &self.0
    }
}

impl Default for SortOrder<ReviewSortField> {
    fn default() -> Self {
        Self::new(SortKey::desc(ReviewSortField::CreatedAt))
    }
}

impl Default for SortOrder<PlaceSortField> {
    fn default() -> Self {
        Self::new(SortKey::asc(PlaceSortField::Name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ordering_uses_default() {
        let order = SortOrder::parse(None, SortKey::desc(ReviewSortField::CreatedAt));
        assert_eq!(order, SortOrder::default());
    }

    #[test]
    fn test_parses_multiple_keys_with_direction() {
        let order = SortOrder::parse(
            Some("-rating,created_at"),
            SortKey::desc(ReviewSortField::CreatedAt),
        );
        assert_eq!(
            order.keys(),
            &[
                SortKey::desc(ReviewSortField::Rating),
                SortKey::asc(ReviewSortField::CreatedAt),
            ]
        );
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let order = SortOrder::parse(Some("text,-rating"), SortKey::desc(ReviewSortField::CreatedAt));
        assert_eq!(order.keys(), &[SortKey::desc(ReviewSortField::Rating)]);

        let order = SortOrder::parse(Some("author_name"), SortKey::asc(PlaceSortField::Name));
        assert_eq!(order, SortOrder::<PlaceSortField>::default());
    }
}
