//! The upstream boundary: where observations come from.

pub mod error;
pub mod json_dir;
pub mod memory;
pub mod query;

use crate::types::observation::Observation;
use error::SourceError;
use query::RecordQuery;
use std::future::Future;

/// A read-only document store.
///
/// Implementations are injected into [`crate::Dashboard`] and closed explicitly
/// through [`RecordSource::shutdown`]. A fetch against a collection that does not
/// exist returns no records rather than an error.
pub trait RecordSource: Send + Sync {
    fn fetch(
        &self,
        query: &RecordQuery,
    ) -> impl Future<Output = Result<Vec<Observation>, SourceError>> + Send;

    /// Releases the source. Later fetches fail with [`SourceError::Closed`].
    fn shutdown(&self) -> impl Future<Output = Result<(), SourceError>> + Send {
        async { Ok(()) }
    }
}
