//! Review sources.

mod reviews;

pub use reviews::{DEFAULT_REVIEWS_PATH, parse_reviews, read_input, read_reviews};
