use crate::source::error::SourceError;
use crate::types::time_window::TimeWindowError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    TimeWindow(#[from] TimeWindowError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed processing DataFrame: {0}")]
    Polars(#[from] PolarsError),

    #[error("Failed to serialize chart")]
    Json(#[from] serde_json::Error),

    #[error("No document with {field} '{id}' in '{collection}'")]
    NotFound {
        collection: String,
        field: String,
        id: String,
    },

    #[error("Failed to read config file '{0}'")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    ConfigParse(PathBuf, #[source] serde_json::Error),
}

impl DashboardError {
    pub(crate) fn not_found(collection: &str, field: &str, id: &str) -> Self {
        DashboardError::NotFound {
            collection: collection.to_string(),
            field: field.to_string(),
            id: id.to_string(),
        }
    }
}
