//! Home sensor history.

use crate::chart::layout::{Axis, Layout};
use crate::chart::trace::{Line, Scatter};
use crate::chart::Chart;
use crate::dashboard::Dashboard;
use crate::error::DashboardError;
use crate::panels::{base_layout, resolve_window};
use crate::reshape::reshape;
use crate::reshape::aggregate::Aggregator;
use crate::source::query::{FieldFilter, RecordQuery, SortOrder};
use crate::source::RecordSource;
use crate::types::observation::{FieldValue, Observation};
use bon::bon;
use chrono::{DateTime, Utc};
use log::debug;

pub const IOT_COLLECTION: &str = "iot.raw";

/// Records kept when the window holds nothing, so a quiet sensor still shows its
/// last reading.
const FALLBACK_RECORDS: usize = 2;

/// Panels over the `iot.raw` sensor log. Obtained via [`Dashboard::iot()`].
pub struct IotPanels<'a, S: RecordSource> {
    dashboard: &'a Dashboard<S>,
}

#[bon]
impl<'a, S: RecordSource> IotPanels<'a, S> {
    pub(crate) fn new(dashboard: &'a Dashboard<S>) -> Self {
        Self { dashboard }
    }

    /// One line per sensor over the window.
    ///
    /// # Arguments (Initial Builder Method)
    ///
    /// * `sensors` - Entity ids, e.g. `"sensor.garage_temp"`.
    ///
    /// # Builder Methods
    ///
    /// * `.time(&str)` (required): window token such as `"h6"` or `"d1"`.
    /// * `.now(DateTime<Utc>)`: end of the window, defaults to the current time.
    ///
    /// # Returns
    ///
    /// A chart whose x axis spans the window. When nothing was recorded inside the
    /// window, the latest two records of the sensors are shown instead. Sensors
    /// without any record get no trace.
    ///
    /// # Errors
    ///
    /// [`DashboardError::TimeWindow`] for an invalid `time` token.
    #[builder(start_fn = sensors)]
    #[doc(hidden)]
    pub async fn build_sensors(
        &self,
        #[builder(start_fn)] sensors: &[&str],
        time: &str,
        now: Option<DateTime<Utc>>,
    ) -> Result<Chart, DashboardError> {
        let window = resolve_window(time, now)?;
        let ids = sensors.iter().map(|s| FieldValue::from(*s)).collect();
        let query = RecordQuery::new(IOT_COLLECTION)
            .filter("entity_id", FieldFilter::In(ids))
            .sort("timestamp_", SortOrder::Descending);

        let mut records = self
            .dashboard
            .fetch_or_empty(&query.clone().within("timestamp_", &window))
            .await;
        if records.is_empty() {
            debug!(
                "No sensor readings in {} to {}, falling back to the latest {}",
                window.start, window.end, FALLBACK_RECORDS
            );
            records = self
                .dashboard
                .fetch_or_empty(&query.limit(FALLBACK_RECORDS))
                .await;
        }

        let config = self.dashboard.config();
        let layout = Layout {
            showlegend: Some(true),
            hovermode: Some("closest".to_string()),
            xaxis: Some(Axis::default().range(window.start, window.end)),
            ..base_layout(config)
        }
        .horizontal_legend()
        .set("colorway", config.colorway.clone())
        .set("uirevision", true);

        let mut chart = Chart::new(layout);
        for sensor in sensors {
            let readings: Vec<Observation> = records
                .iter()
                .filter(|r| r.text("entity_id") == Some(*sensor))
                .cloned()
                .collect();
            let series = reshape(&readings, "timestamp_", "state", Aggregator::Last);
            if series.is_empty() {
                continue;
            }
            chart.push(
                Scatter::from_series(&series.with_name(*sensor))
                    .lines(Line::spline(config.iot_smoothing, config.line_width)),
            );
        }
        Ok(chart)
    }
}
