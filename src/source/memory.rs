use crate::source::error::SourceError;
use crate::source::query::RecordQuery;
use crate::source::RecordSource;
use crate::types::observation::Observation;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Collections held in memory. Mostly useful for tests and demos.
#[derive(Debug, Default)]
pub struct InMemorySource {
    collections: HashMap<String, Vec<Observation>>,
    closed: AtomicBool,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, name: impl Into<String>, records: Vec<Observation>) -> Self {
        self.insert(name, records);
        self
    }

    /// Appends to a collection, creating it when needed.
    pub fn insert(&mut self, name: impl Into<String>, records: Vec<Observation>) {
        self.collections
            .entry(name.into())
            .or_default()
            .extend(records);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl RecordSource for InMemorySource {
    async fn fetch(&self, query: &RecordQuery) -> Result<Vec<Observation>, SourceError> {
        if self.is_closed() {
            return Err(SourceError::Closed);
        }
        let Some(records) = self.collections.get(&query.collection) else {
            return Ok(Vec::new());
        };
        Ok(query.apply(records.iter().cloned()))
    }

    async fn shutdown(&self) -> Result<(), SourceError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::query::FieldFilter;

    fn source() -> InMemorySource {
        InMemorySource::new().with_collection(
            "iot.raw",
            vec![
                Observation::new().with("entity_id", "sensor.a").with("state", 1.0),
                Observation::new().with("entity_id", "sensor.b").with("state", 2.0),
            ],
        )
    }

    #[tokio::test]
    async fn test_fetch_filters() -> Result<(), SourceError> {
        let records = source()
            .fetch(
                &RecordQuery::new("iot.raw")
                    .filter("entity_id", FieldFilter::Eq("sensor.b".into())),
            )
            .await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].number("state"), Some(2.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_collection_is_empty() -> Result<(), SourceError> {
        let records = source().fetch(&RecordQuery::new("nope")).await?;
        assert!(records.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_after_shutdown_fails() {
        let source = source();
        source.shutdown().await.unwrap();
        assert!(source.is_closed());
        let result = source.fetch(&RecordQuery::new("iot.raw")).await;
        assert!(matches!(result, Err(SourceError::Closed)));
    }
}
