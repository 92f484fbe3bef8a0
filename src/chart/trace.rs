use crate::frame::surface::SurfaceGrid;
use crate::types::series::{BucketKey, Series};
use serde::Serialize;

/// A plotly colorscale: a named one (`"Viridis"`) or explicit `[stop, color]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Colorscale {
    Named(String),
    Stops(Vec<(f64, String)>),
}

impl Colorscale {
    pub fn named(name: impl Into<String>) -> Self {
        Colorscale::Named(name.into())
    }

    pub fn stops<S: Into<String>>(stops: impl IntoIterator<Item = (f64, S)>) -> Self {
        Colorscale::Stops(stops.into_iter().map(|(s, c)| (s, c.into())).collect())
    }

    /// Color of the `n`th stop, if any.
    pub fn color(&self, n: usize) -> Option<&str> {
        match self {
            Colorscale::Named(_) => None,
            Colorscale::Stops(stops) => stops.get(n).map(|(_, c)| c.as_str()),
        }
    }
}

/// A single color or one value per point (mapped through the colorscale).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Single(String),
    PerPoint(Vec<f64>),
}

impl From<&str> for ColorSpec {
    fn from(value: &str) -> Self {
        ColorSpec::Single(value.to_string())
    }
}

impl From<String> for ColorSpec {
    fn from(value: String) -> Self {
        ColorSpec::Single(value)
    }
}

impl From<Vec<f64>> for ColorSpec {
    fn from(value: Vec<f64>) -> Self {
        ColorSpec::PerPoint(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<String>,
}

impl Line {
    /// The smoothed line every time-series panel draws.
    pub fn spline(smoothing: f64, width: f64) -> Self {
        Self {
            shape: Some("spline".to_string()),
            smoothing: Some(smoothing),
            width: Some(width),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<Colorscale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showscale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorbar: Option<ColorBar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
}

impl Marker {
    /// A solid marker of the given size and color.
    pub fn solid(size: f64, color: impl Into<String>) -> Self {
        Self {
            size: Some(size),
            color: Some(ColorSpec::Single(color.into())),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorBar {
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scatter {
    pub name: String,
    pub x: Vec<BucketKey>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legendgroup: Option<String>,
}

impl Scatter {
    pub fn from_series(series: &Series) -> Self {
        Self {
            name: series.name.clone(),
            x: series.xs(),
            y: series.ys(),
            ..Self::default()
        }
    }

    pub fn lines(mut self, line: Line) -> Self {
        self.mode = Some("lines".to_string());
        self.line = Some(line);
        self
    }

    pub fn markers(mut self, marker: Marker) -> Self {
        self.mode = Some("markers".to_string());
        self.marker = Some(marker);
        self
    }

    pub fn on_yaxis(mut self, axis: impl Into<String>) -> Self {
        self.yaxis = Some(axis.into());
        self
    }

    pub fn on_xaxis(mut self, axis: impl Into<String>) -> Self {
        self.xaxis = Some(axis.into());
        self
    }

    pub fn fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Heatmap {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub x: Vec<BucketKey>,
    pub y: Vec<String>,
    /// Row per `y` entry.
    pub z: Vec<Vec<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<Colorscale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showscale: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Surface {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<Vec<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<Colorscale>,
    pub connectgaps: bool,
}

impl From<SurfaceGrid> for Surface {
    fn from(grid: SurfaceGrid) -> Self {
        Self {
            x: grid.x,
            y: grid.y,
            z: grid.z,
            colorscale: None,
            connectgaps: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BarPolar {
    pub name: String,
    pub r: Vec<f64>,
    pub theta: Vec<BucketKey>,
    /// Angular width of each bar in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

impl BarPolar {
    pub fn from_series(series: &Series) -> Self {
        Self {
            name: series.name.clone(),
            r: series.ys(),
            theta: series.xs(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScatterMapbox {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoverinfo: Option<String>,
    /// `true`, `false` or `"legendonly"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<serde_json::Value>,
}

impl ScatterMapbox {
    pub fn markers(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: "markers".to_string(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, lat: f64, lon: f64, text: Option<String>) {
        self.lat.push(lat);
        self.lon.push(lon);
        if let Some(text) = text {
            self.text.push(text);
        }
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }
}

/// One drawable element of a [`crate::Chart`], tagged with its plotly `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(Scatter),
    Heatmap(Heatmap),
    Surface(Surface),
    Barpolar(BarPolar),
    Scattermapbox(ScatterMapbox),
}

impl From<Scatter> for Trace {
    fn from(value: Scatter) -> Self {
        Trace::Scatter(value)
    }
}

impl From<Heatmap> for Trace {
    fn from(value: Heatmap) -> Self {
        Trace::Heatmap(value)
    }
}

impl From<Surface> for Trace {
    fn from(value: Surface) -> Self {
        Trace::Surface(value)
    }
}

impl From<BarPolar> for Trace {
    fn from(value: BarPolar) -> Self {
        Trace::Barpolar(value)
    }
}

impl From<ScatterMapbox> for Trace {
    fn from(value: ScatterMapbox) -> Self {
        Trace::Scattermapbox(value)
    }
}
