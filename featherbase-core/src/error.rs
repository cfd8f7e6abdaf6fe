// src/error.rs
// Error types for query and aggregation evaluation

use thiserror::Error;

/// Errors raised while evaluating a find or aggregate call.
///
/// Every error aborts the whole call; there is no partial-result path.
/// Missing record fields are never errors - they resolve to an absent
/// value and flow through the comparison/accumulation rules.
#[derive(Error, Debug)]
pub enum FeatherBaseError {
    /// A comparison or accumulator operator outside the supported set
    /// (e.g. `$regex` in a match expression, `$first` in a group spec).
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// A group output-field definition that is not a one-key operator
    /// object, e.g. `{"total": 5}` or `{"total": {"$sum": "$a", "$min": "$a"}}`.
    #[error("Unsupported structure for field: {0}")]
    UnsupportedFieldStructure(String),

    /// Malformed match expression or find options.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Malformed group specification or aggregate options.
    #[error("Invalid aggregation: {0}")]
    InvalidAggregation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, FeatherBaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FeatherBaseError::UnsupportedOperator("$regex".to_string());
        assert_eq!(err.to_string(), "Unsupported operator: $regex");

        let err = FeatherBaseError::UnsupportedFieldStructure("total".to_string());
        assert_eq!(err.to_string(), "Unsupported structure for field: total");
    }

    #[test]
    fn test_serde_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: FeatherBaseError = json_err.into();
        assert!(matches!(err, FeatherBaseError::Serialization(_)));
    }
}
