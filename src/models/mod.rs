pub mod ordering;
pub mod pagination;
pub mod place;
pub mod review;

pub use ordering::{PlaceSortField, ReviewSortField, SortField, SortKey, SortOrder};
pub use pagination::{Page, PageRequest};
pub use place::{NewPlace, Place};
pub use review::{NewReview, Review};
