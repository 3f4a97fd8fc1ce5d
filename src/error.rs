//! Error types for loading federation data.
//!
//! Aggregation itself never fails; these errors only surface when a record
//! is structurally unusable or a file cannot be read.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning raw JSON into validated records.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A field with no sensible default was absent, null, or blank.
    #[error("{entity} is missing required field `{field}`")]
    MissingRequiredField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("Malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StatsError {
    /// Shorthand for a missing required field.
    pub fn missing(entity: &'static str, field: &'static str) -> Self {
        StatsError::MissingRequiredField { entity, field }
    }
}
