//! Professor review records as they appear in the source file.

use serde::{Deserialize, Serialize};

/// One student review. Every field is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Professor name, also used as the vector id.
    pub professor: String,
    /// Review text that gets embedded.
    pub review: String,
    pub subject: String,
    pub stars: f64,
}

/// Top-level shape of the review file: `{"reviews": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewFile {
    pub reviews: Vec<Review>,
}
