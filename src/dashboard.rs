//! The main entry point: a record source plus display settings, handing out the
//! panel builders.

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::panels::aprs::AprsPanels;
use crate::panels::gallery::GalleryPanels;
use crate::panels::iot::IotPanels;
use crate::panels::oilgas::OilGasPanels;
use crate::panels::weather::WeatherPanels;
use crate::source::error::SourceError;
use crate::source::query::RecordQuery;
use crate::source::RecordSource;
use crate::types::observation::Observation;
use log::warn;
use serde::Serialize;

/// Builds dashboard panels from the documents of an injected [`RecordSource`].
///
/// Each panel call is independent: it fetches what it needs, reshapes it and
/// returns serializable charts. Nothing is cached between calls.
///
/// # Examples
///
/// ```rust
/// # use dashframe::{Dashboard, DashboardError, InMemorySource, Observation};
/// # use chrono::{TimeZone, Utc};
/// # async fn run() -> Result<(), DashboardError> {
/// let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
/// let source = InMemorySource::new().with_collection(
///     "iot.raw",
///     vec![Observation::new()
///         .with("entity_id", "sensor.garage_temp")
///         .with("timestamp_", now)
///         .with("state", 22.5)],
/// );
/// let dashboard = Dashboard::new(source);
/// let chart = dashboard
///     .iot()
///     .sensors(&["sensor.garage_temp"])
///     .time("h6")
///     .now(now)
///     .call()
///     .await?;
/// assert_eq!(chart.data.len(), 1);
/// dashboard.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct Dashboard<S: RecordSource> {
    source: S,
    config: DashboardConfig,
}

impl<S: RecordSource> Dashboard<S> {
    /// Uses the default [`DashboardConfig`].
    pub fn new(source: S) -> Self {
        Self::with_config(source, DashboardConfig::default())
    }

    pub fn with_config(source: S, config: DashboardConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Raw access to the source, errors included.
    pub async fn fetch(&self, query: &RecordQuery) -> Result<Vec<Observation>, SourceError> {
        self.source.fetch(query).await
    }

    /// Fetches `query`, turning a source failure into an empty record set. The
    /// failure is logged; reshaping downstream only ever sees "no records".
    pub async fn fetch_or_empty(&self, query: &RecordQuery) -> Vec<Observation> {
        match self.source.fetch(query).await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "Fetching from '{}' failed, continuing without records: {}",
                    query.collection, e
                );
                Vec::new()
            }
        }
    }

    /// First record matching `query`, or [`DashboardError::NotFound`].
    pub(crate) async fn fetch_one(
        &self,
        query: RecordQuery,
        field: &str,
        id: &str,
    ) -> Result<Observation, DashboardError> {
        let collection = query.collection.clone();
        let mut records = self.source.fetch(&query.limit(1)).await?;
        if records.is_empty() {
            return Err(DashboardError::not_found(&collection, field, id));
        }
        Ok(records.swap_remove(0))
    }

    /// Closes the underlying source.
    pub async fn shutdown(self) -> Result<(), DashboardError> {
        self.source.shutdown().await?;
        Ok(())
    }

    pub fn iot(&self) -> IotPanels<'_, S> {
        IotPanels::new(self)
    }

    pub fn weather(&self) -> WeatherPanels<'_, S> {
        WeatherPanels::new(self)
    }

    pub fn aprs(&self) -> AprsPanels<'_, S> {
        AprsPanels::new(self)
    }

    pub fn oilgas(&self) -> OilGasPanels<'_, S> {
        OilGasPanels::new(self)
    }

    pub fn gallery(&self) -> GalleryPanels<'_, S> {
        GalleryPanels::new(self)
    }
}

/// Serializes a panel result for the front end. A failed panel is logged and
/// yields `None` so the rest of the page still renders.
///
/// # Examples
///
/// ```
/// use dashframe::{panel_json, Chart, DashboardError, TimeWindow};
///
/// let ok: Result<Chart, DashboardError> = Ok(Chart::default());
/// assert_eq!(panel_json(ok).as_deref(), Some(r#"{"data":[],"layout":{}}"#));
///
/// let failed: Result<Chart, DashboardError> = TimeWindow::resolve_now("m:5")
///     .map(|_| Chart::default())
///     .map_err(DashboardError::from);
/// assert!(panel_json(failed).is_none());
/// ```
pub fn panel_json<T: Serialize>(result: Result<T, DashboardError>) -> Option<String> {
    let value = match result {
        Ok(value) => value,
        Err(e) => {
            warn!("Panel failed: {e}");
            return None;
        }
    };
    match serde_json::to_string(&value) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("Panel could not be serialized: {e}");
            None
        }
    }
}
