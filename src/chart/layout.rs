use crate::types::series::BucketKey;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// `autorange` is either on (`true`) or reversed (`"reversed"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoRange {
    Auto,
    Reversed,
}

impl Serialize for AutoRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AutoRange::Auto => serializer.serialize_bool(true),
            AutoRange::Reversed => serializer.serialize_str("reversed"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<(BucketKey, BucketKey)>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub axis_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<(f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixedrange: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autorange: Option<AutoRange>,
    /// Anything else plotly understands (`tickfont`, `showgrid`, `rotation`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Axis {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn range(mut self, lower: impl Into<BucketKey>, upper: impl Into<BucketKey>) -> Self {
        self.range = Some((lower.into(), upper.into()));
        self
    }

    pub fn log(self) -> Self {
        self.of_type("log")
    }

    pub fn date(self) -> Self {
        self.of_type("date")
    }

    /// Sets the plotly axis `type` (`"linear"`, `"log"`, `"date"`, `"category"`).
    pub fn of_type(mut self, axis_type: impl Into<String>) -> Self {
        self.axis_type = Some(axis_type.into());
        self
    }

    /// A secondary axis drawn over `axis` (`"y"`) on the given side.
    pub fn overlay(mut self, axis: impl Into<String>, side: impl Into<String>) -> Self {
        self.overlaying = Some(axis.into());
        self.side = Some(side.into());
        self
    }

    pub fn domain(mut self, lower: f64, upper: f64) -> Self {
        self.domain = Some((lower, upper));
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixedrange = Some(true);
        self
    }

    pub fn reversed(mut self) -> Self {
        self.autorange = Some(AutoRange::Reversed);
        self
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Font {
    pub fn family(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            size: None,
            color: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margin {
    pub l: f64,
    pub r: f64,
    pub t: f64,
    pub b: f64,
    pub pad: f64,
}

impl Margin {
    pub fn new(l: f64, r: f64, t: f64, b: f64) -> Self {
        Self { l, r, t, b, pad: 0.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scene {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspectmode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Polar {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radialaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angularaxis: Option<Axis>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapCenter {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mapbox {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accesstoken: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<MapCenter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
}

/// Display options of a chart. The typed fields cover what the panels set; any
/// other plotly layout key goes into `extra` and is serialized alongside them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autosize: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovermode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis2: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis3: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<Scene>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polar: Option<Polar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapbox: Option<Mapbox>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Passes an arbitrary option through to the renderer.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Horizontal legend below the plot.
    pub fn horizontal_legend(self) -> Self {
        self.set("legend", serde_json::json!({ "orientation": "h" }))
    }
}
