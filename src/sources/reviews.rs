//! Reading the `{"reviews": [...]}` JSON document.

use std::io::{self, Read};
use std::path::Path;

use crate::error::SourceError;
use crate::models::{Review, ReviewFile};

pub const DEFAULT_REVIEWS_PATH: &str = "reviews.json";

/// Read raw input from a file, or from stdin when the path is `-`.
pub fn read_input(path: &Path) -> Result<String, SourceError> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        return Ok(input);
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Parse the review document. A review missing any field is an error.
pub fn parse_reviews(input: &str) -> Result<Vec<Review>, SourceError> {
    let file: ReviewFile = serde_json::from_str(input)?;
    Ok(file.reviews)
}

pub fn read_reviews(path: &Path) -> Result<Vec<Review>, SourceError> {
    let input = read_input(path)?;
    let reviews = parse_reviews(&input)?;
    tracing::debug!(path = %path.display(), count = reviews.len(), "loaded reviews");
    Ok(reviews)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "reviews": [
            {"professor": "Dr. Emily Johnson", "review": "Engaging lectures.", "subject": "Biology", "stars": 5},
            {"professor": "Prof. Michael Chen", "review": "Tough grader.", "subject": "Physics", "stars": 2.5}
        ]
    }"#;

    #[test]
    fn test_parse_reviews() {
        let reviews = parse_reviews(SAMPLE).unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].professor, "Dr. Emily Johnson");
        assert_eq!(reviews[0].stars, 5.0);
        assert_eq!(reviews[1].subject, "Physics");
        assert_eq!(reviews[1].stars, 2.5);
    }

    #[test]
    fn test_missing_field_is_error() {
        let input = r#"{"reviews": [{"professor": "Dr. X", "review": "Fine.", "stars": 3}]}"#;
        let err = parse_reviews(input).unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
        assert!(err.to_string().contains("subject"));
    }

    #[test]
    fn test_wrong_field_type_is_error() {
        let input = r#"{"reviews": [{"professor": "Dr. X", "review": "Fine.", "subject": "Art", "stars": "five"}]}"#;
        assert!(parse_reviews(input).is_err());
    }

    #[test]
    fn test_missing_reviews_key_is_error() {
        assert!(parse_reviews(r#"{"items": []}"#).is_err());
    }

    #[test]
    fn test_empty_reviews() {
        assert!(parse_reviews(r#"{"reviews": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_read_reviews_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let reviews = read_reviews(file.path()).unwrap();
        assert_eq!(reviews.len(), 2);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_reviews(Path::new("/nonexistent/reviews.json")).unwrap_err();
        assert!(matches!(err, SourceError::IoError(_)));
    }
}
