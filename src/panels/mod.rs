//! Panel builders: each one fetches its records, reshapes them and lays out charts.
//!
//! The builders are reached through [`crate::Dashboard`]. The helpers below hold
//! the layout pieces every panel shares.

pub mod aprs;
pub mod gallery;
pub mod iot;
pub mod oilgas;
pub mod palette;
pub mod weather;

use crate::chart::layout::{Axis, Font, Layout, MapCenter, Mapbox, Margin};
use crate::chart::trace::Line;
use crate::config::DashboardConfig;
use crate::reshape::aggregate::quantile;
use crate::types::geo::LatLon;
use crate::types::time_window::{TimeWindow, TimeWindowError};
use chrono::{DateTime, Utc};
use serde_json::json;

/// Resolves `time` against `now`, or against the current time when unset.
pub(crate) fn resolve_window(
    time: &str,
    now: Option<DateTime<Utc>>,
) -> Result<TimeWindow, TimeWindowError> {
    match now {
        Some(now) => TimeWindow::resolve(time, now),
        None => TimeWindow::resolve_now(time),
    }
}

fn hoverlabel(config: &DashboardConfig) -> serde_json::Value {
    json!({ "font": { "family": config.font_family } })
}

/// The layout of the time-series charts.
pub(crate) fn base_layout(config: &DashboardConfig) -> Layout {
    Layout {
        autosize: Some(true),
        font: Some(Font::family(&config.font_family)),
        margin: Some(Margin::new(60.0, 50.0, 30.0, 30.0)),
        ..Layout::default()
    }
    .set("hoverlabel", hoverlabel(config))
}

/// A borderless map centered on `center`.
pub(crate) fn map_layout(config: &DashboardConfig, center: LatLon, zoom: f64) -> Layout {
    Layout {
        autosize: Some(true),
        font: Some(Font::family(&config.font_family)),
        showlegend: Some(false),
        hovermode: Some("closest".to_string()),
        margin: Some(Margin::new(0.0, 0.0, 0.0, 0.0)),
        mapbox: Some(Mapbox {
            accesstoken: config.map_token.clone(),
            style: Some(config.map_style.clone()),
            center: Some(MapCenter {
                lat: center.lat(),
                lon: center.lon(),
            }),
            zoom: Some(zoom),
            bearing: Some(0.0),
            pitch: Some(0.0),
        }),
        ..Layout::default()
    }
    .set("hoverlabel", hoverlabel(config))
    .set("uirevision", true)
}

pub(crate) fn spline(config: &DashboardConfig, color: &str) -> Line {
    Line::spline(config.smoothing, config.line_width).with_color(color)
}

/// A date axis spanning the whole window.
pub(crate) fn window_axis(window: &TimeWindow) -> Axis {
    Axis::default()
        .range(window.start, window.end)
        .date()
}

/// 1st and 99th percentile of `values`, the default color range of map markers.
pub(crate) fn percentile_range(values: &[f64]) -> Option<(f64, f64)> {
    Some((quantile(values, 0.01)?, quantile(values, 0.99)?))
}
