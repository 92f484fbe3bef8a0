//! APRS reception range and station tracks.

use crate::chart::layout::{Axis, Layout};
use crate::chart::trace::{ColorBar, ColorSpec, Marker, Scatter, ScatterMapbox};
use crate::chart::Chart;
use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::error::DashboardError;
use crate::panels::palette::{self, ramp, MONTH_RAMP};
use crate::panels::{base_layout, map_layout, percentile_range, resolve_window, spline, window_axis};
use crate::reshape::aggregate::Aggregator;
use crate::reshape::grouping::Grouping;
use crate::reshape::{partition, reshape_with};
use crate::source::query::{FieldFilter, RecordQuery, SortOrder};
use crate::source::RecordSource;
use crate::types::geo::{Geofence, LatLon};
use crate::types::observation::Observation;
use crate::types::time_window::TimeWindow;
use crate::types::units::{round_to, Conversion};
use bon::bon;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use serde_json::json;

pub const APRS_COLLECTION: &str = "aprs.raw";

const RECEIVED_AT: &str = "timestamp_";
const PREFIX_SCRIPT: &str = "prefix";

/// Property a track map can be colored by, with the conversion to display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackProperty {
    Altitude,
    Speed,
    Course,
}

impl TrackProperty {
    /// `None` for `"none"` and anything unrecognized: plain markers.
    pub fn parse(prop: &str) -> Option<Self> {
        match prop {
            "altitude" => Some(TrackProperty::Altitude),
            "speed" => Some(TrackProperty::Speed),
            "course" => Some(TrackProperty::Course),
            _ => None,
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            TrackProperty::Altitude => "altitude",
            TrackProperty::Speed => "speed",
            TrackProperty::Course => "course",
        }
    }

    /// Meters to feet, km/h to mph, degrees unchanged.
    pub fn conversion(&self) -> Conversion {
        match self {
            TrackProperty::Altitude => Conversion::METERS_TO_FEET,
            TrackProperty::Speed => Conversion::KMH_TO_MPH,
            TrackProperty::Course => Conversion::Identity,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            TrackProperty::Altitude => "ft",
            TrackProperty::Speed => "mph",
            TrackProperty::Course => "degrees",
        }
    }
}

/// One row of the track table, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRow {
    #[serde(rename = "timestamp_")]
    pub timestamp: String,
    pub from: String,
    pub to: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed: Option<f64>,
    pub altitude: Option<f64>,
    pub course: Option<f64>,
}

impl TrackRow {
    fn from_observation(record: &Observation) -> Self {
        let rounded = |key: &str, decimals| record.number(key).map(|v| round_to(v, decimals));
        Self {
            timestamp: record
                .timestamp(RECEIVED_AT)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            from: record.text("from").unwrap_or_default().to_string(),
            to: record.text("to").unwrap_or_default().to_string(),
            latitude: rounded("latitude", 3),
            longitude: rounded("longitude", 3),
            speed: rounded("speed", 2),
            altitude: rounded("altitude", 1),
            course: rounded("course", 1),
        }
    }
}

/// The map, the three time-series charts and the table of a track.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AprsTrack {
    pub map: Chart,
    pub speed: Chart,
    pub altitude: Chart,
    pub course: Chart,
    /// Newest first.
    pub rows: Vec<TrackRow>,
}

/// Panels over received APRS packets. Obtained via [`Dashboard::aprs()`].
pub struct AprsPanels<'a, S: RecordSource> {
    dashboard: &'a Dashboard<S>,
}

#[bon]
impl<'a, S: RecordSource> AprsPanels<'a, S> {
    pub(crate) fn new(dashboard: &'a Dashboard<S>) -> Self {
        Self { dashboard }
    }

    /// Reception range: for each month of the window, how many position reports
    /// arrived from each (whole km) distance around the home location. Reports
    /// beyond the configured range are left out.
    ///
    /// # Errors
    ///
    /// [`DashboardError::TimeWindow`] for an invalid `time` token.
    #[builder(start_fn = range)]
    #[doc(hidden)]
    pub async fn build_range(
        &self,
        #[builder(start_fn)] time: &str,
        now: Option<DateTime<Utc>>,
    ) -> Result<Chart, DashboardError> {
        let window = resolve_window(time, now)?;
        let query = positions(&window, "entry").sort(RECEIVED_AT, SortOrder::Descending);
        let records = self.dashboard.fetch_or_empty(&query).await;
        Ok(range_chart(&records, self.dashboard.config()))
    }

    /// Track of the packets logged by `script`, colored by `prop` (`"altitude"`,
    /// `"speed"`, `"course"` or `"none"`).
    ///
    /// For the `prefix` script only the configured callsign's own packets are
    /// shown.
    ///
    /// # Errors
    ///
    /// [`DashboardError::TimeWindow`] for an invalid `time` token.
    #[builder(start_fn = track)]
    #[doc(hidden)]
    pub async fn build_track(
        &self,
        #[builder(start_fn)] script: &str,
        #[builder(start_fn)] prop: &str,
        time: &str,
        now: Option<DateTime<Utc>>,
    ) -> Result<AprsTrack, DashboardError> {
        let window = resolve_window(time, now)?;
        let config = self.dashboard.config();
        let mut query = positions(&window, script);
        if script == PREFIX_SCRIPT {
            if let Some(callsign) = &config.aprs_callsign {
                query = query.filter("from", FieldFilter::Eq(callsign.as_str().into()));
            }
        }
        let records = self
            .dashboard
            .fetch_or_empty(&query.sort(RECEIVED_AT, SortOrder::Descending))
            .await;
        debug!("{} APRS packets for script '{}'", records.len(), script);
        Ok(track(&records, TrackProperty::parse(prop), &window, config))
    }
}

/// Position reports of `script` within the window.
fn positions(window: &TimeWindow, script: &str) -> RecordQuery {
    RecordQuery::new(APRS_COLLECTION)
        .filter("script", FieldFilter::Eq(script.into()))
        .filter("latitude", FieldFilter::Exists(true))
        .within(RECEIVED_AT, window)
}

fn range_chart(records: &[Observation], config: &DashboardConfig) -> Chart {
    let fence = Geofence::km(config.home, config.aprs_range_km);
    let located: Vec<Observation> = fence
        .select(records, "latitude", "longitude")
        .into_iter()
        .map(|(distance, record)| record.clone().with("distance", distance))
        .collect();

    let months = partition(&located, RECEIVED_AT, Grouping::Month);
    let colors = ramp(&MONTH_RAMP, months.len());

    let layout = Layout {
        yaxis: Some(Axis::titled("Frequency").domain(0.02, 0.98).log()),
        xaxis: Some(Axis::titled("Distance (km)").log()),
        ..base_layout(config)
    };
    let mut chart = Chart::new(layout);
    for ((month, group), color) in months.into_iter().zip(&colors) {
        let group: Vec<Observation> = group.into_iter().cloned().collect();
        let series = reshape_with(&group)
            .group_key("distance")
            .value_key("distance")
            .grouping(Grouping::Round { resolution: 1.0 })
            .aggregator(Aggregator::Count)
            .name(month.to_string())
            .call();
        chart.push(Scatter::from_series(&series).lines(spline(config, color)));
    }
    chart
}

fn track(
    records: &[Observation],
    property: Option<TrackProperty>,
    window: &TimeWindow,
    config: &DashboardConfig,
) -> AprsTrack {
    let mut trace = ScatterMapbox::markers("");
    let mut raw_values = Vec::new();
    for record in records {
        let Some(at) = LatLon::from_observation(record, "latitude", "longitude") else {
            continue;
        };
        trace.push(
            at.lat(),
            at.lon(),
            Some(record.text("raw").unwrap_or_default().to_string()),
        );
        if let Some(property) = property {
            raw_values.push(record.number(property.field()).unwrap_or(f64::NAN));
        }
    }

    let marker = match property {
        None => Marker {
            size: Some(10.0),
            ..Marker::default()
        },
        Some(property) => {
            let conversion = property.conversion();
            let (colorscale, range) = match property {
                TrackProperty::Course => (palette::circle(), Some((0.0, 359.0))),
                _ => {
                    let present: Vec<f64> =
                        raw_values.iter().copied().filter(|v| !v.is_nan()).collect();
                    (palette::normal(), percentile_range(&present))
                }
            };
            Marker {
                size: Some(10.0),
                color: Some(ColorSpec::PerPoint(
                    raw_values.iter().map(|v| conversion.apply(*v)).collect(),
                )),
                colorscale: Some(colorscale),
                cmin: range.map(|(lo, _)| conversion.apply(lo)),
                cmax: range.map(|(_, hi)| conversion.apply(hi)),
                colorbar: Some(ColorBar {
                    title: property.unit().to_string(),
                }),
                ..Marker::default()
            }
        }
    };
    let map =
        Chart::new(map_layout(config, config.home, 6.0)).with_trace(trace.with_marker(marker));

    let over_time = |property: TrackProperty, title: &str, color: &str| {
        let series = reshape_with(records)
            .group_key(RECEIVED_AT)
            .value_key(property.field())
            .aggregator(Aggregator::Last)
            .conversion(property.conversion())
            .name(title)
            .call();
        let layout = Layout {
            showlegend: Some(false),
            xaxis: Some(window_axis(window)),
            yaxis: Some(
                Axis::titled(title)
                    .domain(0.02, 0.98)
                    .fixed()
                    .set("titlefont", json!({ "color": "rgb(255, 95, 63)" })),
            ),
            ..base_layout(config)
        }
        .set("height", 200);
        Chart::new(layout).with_trace(Scatter::from_series(&series).lines(spline(config, color)))
    };

    AprsTrack {
        map,
        speed: over_time(TrackProperty::Speed, "Speed (mph)", "rgb(255, 127, 63)"),
        altitude: over_time(TrackProperty::Altitude, "Altitude (ft)", "rgb(255, 95, 63)"),
        course: over_time(TrackProperty::Course, "Course (degrees)", "rgb(255, 63, 63)"),
        rows: records.iter().map(TrackRow::from_observation).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::trace::Trace;
    use crate::config::DEFAULT_HOME;
    use crate::source::memory::InMemorySource;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn packet(script: &str, days_ago: i64, lat: f64, lon: f64) -> Observation {
        Observation::new()
            .with("script", script)
            .with(RECEIVED_AT, now() - Duration::days(days_ago))
            .with("latitude", lat)
            .with("longitude", lon)
            .with("from", "KK6GPV-9")
            .with("to", "APRS")
            .with("raw", "KK6GPV-9>APRS:!2946.85N/09525.22W")
            .with("speed", 100.0)
            .with("altitude", 10.0)
            .with("course", 270.04)
    }

    #[test]
    fn test_range_counts_per_month_and_distance() {
        let LatLon(lat, lon) = DEFAULT_HOME;
        let records = vec![
            packet("entry", 1, lat, lon),
            packet("entry", 2, lat, lon),
            packet("entry", 2, lat + 0.1, lon),
            packet("entry", 20, lat, lon),
            // Dallas, beyond the default 250 km.
            packet("entry", 3, 32.78, -96.80),
        ];
        let chart = range_chart(&records, &DashboardConfig::default());
        assert_eq!(chart.data.len(), 2);
        let value = chart.to_value().unwrap();
        assert_eq!(value["data"][0]["name"], "2024-02");
        assert_eq!(value["data"][0]["y"], json!([1.0]));
        assert_eq!(value["data"][1]["name"], "2024-03");
        assert_eq!(value["data"][1]["x"], json!([0.0, 11.0]));
        assert_eq!(value["data"][1]["y"], json!([2.0, 1.0]));
        assert_eq!(value["layout"]["xaxis"]["type"], "log");
    }

    #[tokio::test]
    async fn test_range_filters_script_and_window() -> Result<(), DashboardError> {
        let LatLon(lat, lon) = DEFAULT_HOME;
        let source = InMemorySource::new().with_collection(
            APRS_COLLECTION,
            vec![
                packet("entry", 1, lat, lon),
                packet("prefix", 1, lat, lon),
                packet("entry", 40, lat, lon),
                Observation::new()
                    .with("script", "entry")
                    .with(RECEIVED_AT, now()),
            ],
        );
        let dashboard = Dashboard::new(source);
        let chart = dashboard.aprs().range("d7").now(now()).call().await?;
        assert_eq!(chart.data.len(), 1);
        match &chart.data[0] {
            Trace::Scatter(s) => assert_eq!(s.y, vec![1.0]),
            other => panic!("unexpected trace {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_prefix_track_keeps_own_callsign() -> Result<(), DashboardError> {
        let config = DashboardConfig::builder().aprs_callsign("KK6GPV").build();
        let source = InMemorySource::new().with_collection(
            APRS_COLLECTION,
            vec![
                packet("prefix", 1, 29.7, -95.4).with("from", "KK6GPV"),
                packet("prefix", 2, 29.8, -95.5).with("from", "W5XYZ"),
            ],
        );
        let dashboard = Dashboard::with_config(source, config);
        let track = dashboard
            .aprs()
            .track("prefix", "speed")
            .time("d7")
            .now(now())
            .call()
            .await?;
        assert_eq!(track.rows.len(), 1);
        assert_eq!(track.rows[0].from, "KK6GPV");
        Ok(())
    }

    #[test]
    fn test_track_figures() {
        let window = TimeWindow::resolve("d7", now()).unwrap();
        let records = vec![packet("prefix", 1, 29.7, -95.4), packet("prefix", 2, 29.8, -95.5)];
        let track = track(
            &records,
            TrackProperty::parse("speed"),
            &window,
            &DashboardConfig::default(),
        );

        let map = track.map.to_value().unwrap();
        let color = map["data"][0]["marker"]["color"][0].as_f64().unwrap();
        assert!((color - 62.1371).abs() < 1e-9);
        assert_eq!(map["data"][0]["marker"]["colorbar"]["title"], "mph");

        let altitude = track.altitude.to_value().unwrap();
        let feet = altitude["data"][0]["y"][0].as_f64().unwrap();
        assert!((feet - 32.808).abs() < 1e-9);
        assert_eq!(altitude["layout"]["height"], 200);

        assert_eq!(track.rows.len(), 2);
        assert_eq!(track.rows[0].course, Some(270.0));
        assert_eq!(track.rows[0].timestamp, "2024-03-09 12:00:00");
    }

    #[test]
    fn test_track_without_property() {
        let window = TimeWindow::resolve("d7", now()).unwrap();
        let records = vec![packet("prefix", 1, 29.7, -95.4)];
        let config = DashboardConfig::default();
        let track = track(&records, TrackProperty::parse("none"), &window, &config);
        let map = track.map.to_value().unwrap();
        assert_eq!(map["data"][0]["marker"], json!({"size": 10.0}));
    }
}
