use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to resolve data directory")]
    DataDirResolution(#[source] std::io::Error),

    #[error("Failed to create data directory '{0}'")]
    DataDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read collection file '{0}'")]
    CollectionRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse collection file '{0}'")]
    CollectionParse(PathBuf, #[source] serde_json::Error),

    #[error("Invalid collection name '{0}'")]
    InvalidCollection(String),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Record source has been shut down")]
    Closed,
}
