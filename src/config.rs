//! Display and location settings shared by all panels.

use crate::error::DashboardError;
use crate::types::geo::LatLon;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_FONT_FAMILY: &str = "Ubuntu";
pub const DEFAULT_MAP_STYLE: &str = "mapbox://styles/mapbox/dark-v10";
/// Houston, where the home station and APRS receiver sit.
pub const DEFAULT_HOME: LatLon = LatLon(29.780880, -95.420410);

fn default_colorway() -> Vec<String> {
    [
        "#F42ED0", "#2EE8F4", "#3F7FFF", "#FF5F3F", "#7FFF1F", "#FFBE3F", "#BE3FFF", "#1FBEFF",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_series_colors() -> BTreeMap<String, String> {
    [
        ("oil", "#50bf37"),
        ("water", "#4286f4"),
        ("gas", "#ef2626"),
        ("steam", "#e2e539"),
        ("cyclic", "#e56f39"),
        ("water_i", "#28ccc6"),
        ("gas_i", "#a54ae2"),
        ("oilgrav", "#7a4a2c"),
        ("pcsg", "#bcbcbc"),
        ("ptbg", "#7f7f7f"),
        ("btu", "#ffc0cb"),
        ("pinjsurf", "#8c8c8c"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Settings for a [`crate::Dashboard`].
///
/// Every field has a default, so a config file only needs the keys it changes.
///
/// # Examples
///
/// ```
/// use dashframe::{DashboardConfig, LatLon};
///
/// let config = DashboardConfig::builder()
///     .home(LatLon(35.4, -119.0))
///     .aprs_range_km(100.0)
///     .build();
/// assert_eq!(config.font_family, "Ubuntu");
///
/// let parsed: DashboardConfig = serde_json::from_str(r#"{"map_token": "pk.abc"}"#).unwrap();
/// assert_eq!(parsed.map_token.as_deref(), Some("pk.abc"));
/// assert_eq!(parsed.aprs_range_km, 250.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct DashboardConfig {
    #[builder(into, default = DEFAULT_FONT_FAMILY.to_string())]
    pub font_family: String,

    #[builder(into, default = DEFAULT_MAP_STYLE.to_string())]
    pub map_style: String,

    /// Mapbox access token forwarded to map layouts.
    #[builder(into)]
    pub map_token: Option<String>,

    #[builder(default = DEFAULT_HOME)]
    pub home: LatLon,

    #[builder(default = 250.0)]
    pub aprs_range_km: f64,

    /// Station whose own beacons the APRS `prefix` track shows.
    #[builder(into)]
    pub aprs_callsign: Option<String>,

    /// Spline smoothing of the weather, well and APRS lines.
    #[builder(default = 0.3)]
    pub smoothing: f64,

    /// Spline smoothing of the IoT sensor lines.
    #[builder(default = 0.7)]
    pub iot_smoothing: f64,

    #[builder(default = 3.0)]
    pub line_width: f64,

    /// Raw weather values below this are sensor faults.
    #[builder(default = -50.0)]
    pub sensor_floor: f64,

    #[builder(default = default_colorway())]
    pub colorway: Vec<String>,

    /// Line colors of the well production series, keyed by field name.
    #[builder(default = default_series_colors())]
    pub series_colors: BTreeMap<String, String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DashboardConfig {
    /// Reads a JSON config file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::ConfigRead`] if the file cannot be read and
    /// [`DashboardError::ConfigParse`] if it is not valid JSON for this struct.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DashboardError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DashboardError::ConfigRead(path.to_path_buf(), e))?;
        serde_json::from_str(&text).map_err(|e| DashboardError::ConfigParse(path.to_path_buf(), e))
    }

    pub fn series_color(&self, field: &str) -> Option<&str> {
        self.series_colors.get(field).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.home, DEFAULT_HOME);
        assert_eq!(config.sensor_floor, -50.0);
        assert_eq!(config.series_color("oil"), Some("#50bf37"));
        assert!(config.map_token.is_none());
    }

    #[tokio::test]
    async fn test_from_json_file() -> Result<(), DashboardError> {
        let dir = tempdir().map_err(|e| DashboardError::ConfigRead("tmp".into(), e))?;
        let path = dir.path().join("dashboard.json");
        tokio::fs::write(&path, r#"{"home": [35.0, -119.0], "line_width": 2}"#)
            .await
            .map_err(|e| DashboardError::ConfigRead(path.clone(), e))?;

        let config = DashboardConfig::from_json_file(&path).await?;
        assert_eq!(config.home, LatLon(35.0, -119.0));
        assert_eq!(config.line_width, 2.0);
        assert_eq!(config.smoothing, 0.3);
        Ok(())
    }

    #[tokio::test]
    async fn test_from_json_file_errors() {
        let dir = tempdir().unwrap();
        let missing = DashboardConfig::from_json_file(dir.path().join("nope.json")).await;
        assert!(matches!(missing, Err(DashboardError::ConfigRead(..))));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "[1, 2").unwrap();
        let parsed = DashboardConfig::from_json_file(&bad).await;
        assert!(matches!(parsed, Err(DashboardError::ConfigParse(..))));
    }
}
