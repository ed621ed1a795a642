pub mod matching;
pub mod places;
pub mod review_search;
pub mod reviews;

pub use places::PlaceDirectory;
pub use review_search::{ReviewSearch, ReviewSearcher, SearchSettings};
pub use reviews::ReviewCatalog;
