use crate::source::error::SourceError;
use crate::source::query::RecordQuery;
use crate::source::RecordSource;
use crate::types::observation::Observation;
use crate::utils::{ensure_dir_exists, get_data_dir};
use log::{debug, info};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task;

/// Reads each collection from `<dir>/<collection>.json`, a JSON array of documents.
///
/// Files are re-read on every fetch so exports dropped into the directory are
/// picked up without a restart. A missing file is an empty collection.
#[derive(Debug)]
pub struct JsonDirSource {
    dir: PathBuf,
    closed: AtomicBool,
}

impl JsonDirSource {
    /// Uses `dir` as is; it does not have to exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            closed: AtomicBool::new(false),
        }
    }

    /// Opens the default data directory (`dirs::data_dir()/dashframe`), creating it
    /// when missing.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::DataDirResolution`] if the platform has no data
    /// directory and [`SourceError::DataDirCreation`] if it cannot be created.
    pub async fn open_default() -> Result<Self, SourceError> {
        let dir = get_data_dir().map_err(SourceError::DataDirResolution)?;
        ensure_dir_exists(&dir)
            .await
            .map_err(|e| SourceError::DataDirCreation(dir.clone(), e))?;
        info!("Reading collections from {}", dir.display());
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf, SourceError> {
        let valid = !collection.is_empty()
            && !collection.starts_with('.')
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(SourceError::InvalidCollection(collection.to_string()));
        }
        Ok(self.dir.join(format!("{collection}.json")))
    }

    async fn load(path: PathBuf) -> Result<Vec<Observation>, SourceError> {
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No collection file at {}", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(SourceError::CollectionRead(path, e)),
        };
        let records = task::spawn_blocking(move || {
            serde_json::from_slice::<Vec<Observation>>(&bytes)
                .map_err(|e| SourceError::CollectionParse(path, e))
        })
        .await??;
        Ok(records)
    }
}

impl RecordSource for JsonDirSource {
    async fn fetch(&self, query: &RecordQuery) -> Result<Vec<Observation>, SourceError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SourceError::Closed);
        }
        let path = self.collection_path(&query.collection)?;
        let records = Self::load(path).await?;
        let total = records.len();
        let selected = query.apply(records);
        debug!(
            "Fetched {} of {} records from '{}'",
            selected.len(),
            total,
            query.collection
        );
        Ok(selected)
    }

    async fn shutdown(&self) -> Result<(), SourceError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
