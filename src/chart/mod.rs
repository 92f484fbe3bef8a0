//! The downstream boundary: declarative plotly figures serialized to JSON.

pub mod layout;
pub mod trace;

use layout::Layout;
use serde::Serialize;
use trace::Trace;

/// A plotly figure: `{"data": [...], "layout": {...}}`.
///
/// # Examples
///
/// ```
/// use dashframe::{Chart, Layout, Scatter, Series};
///
/// let mut series = Series::new("temp_f");
/// series.push(1.0, 70.5);
/// let chart = Chart::new(Layout::new().set("uirevision", true))
///     .with_trace(Scatter::from_series(&series));
/// let json = chart.to_json().unwrap();
/// assert!(json.starts_with(r#"{"data":[{"type":"scatter","name":"temp_f""#));
/// assert!(json.contains(r#""uirevision":true"#));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Chart {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Chart {
    pub fn new(layout: Layout) -> Self {
        Self {
            data: Vec::new(),
            layout,
        }
    }

    pub fn with_trace(mut self, trace: impl Into<Trace>) -> Self {
        self.push(trace);
        self
    }

    pub fn push(&mut self, trace: impl Into<Trace>) {
        self.data.push(trace.into());
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
