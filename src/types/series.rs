//! Display-ready series: ordered `(x, y)` pairs keyed by a number, a timestamp or
//! a label.

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Serialize, Serializer};
use std::fmt;

/// Plotly reads this layout unambiguously as a date axis value.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The x value of a series point, and the grouping key of the reshaper.
///
/// Keys are totally ordered: numbers first (by value), then timestamps, then
/// labels (lexicographically). Numbers use [`OrderedFloat`] so they can key
/// ordered maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    Number(OrderedFloat<f64>),
    Timestamp(DateTime<Utc>),
    Label(String),
}

impl BucketKey {
    pub fn number(value: f64) -> Self {
        BucketKey::Number(OrderedFloat(value))
    }

    pub fn label(value: impl Into<String>) -> Self {
        BucketKey::Label(value.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            BucketKey::Number(n) => Some(n.0),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            BucketKey::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<f64> for BucketKey {
    fn from(value: f64) -> Self {
        BucketKey::number(value)
    }
}

impl From<DateTime<Utc>> for BucketKey {
    fn from(value: DateTime<Utc>) -> Self {
        BucketKey::Timestamp(value)
    }
}

impl From<&str> for BucketKey {
    fn from(value: &str) -> Self {
        BucketKey::label(value)
    }
}

impl From<String> for BucketKey {
    fn from(value: String) -> Self {
        BucketKey::Label(value)
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Number(n) => write!(f, "{}", n.0),
            BucketKey::Timestamp(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
            BucketKey::Label(s) => f.write_str(s),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BucketKey::Number(n) => serializer.serialize_f64(n.0),
            BucketKey::Timestamp(_) | BucketKey::Label(_) => {
                serializer.collect_str(self)
            }
        }
    }
}

/// An ordered sequence of points derived from observations.
///
/// An empty series is a valid result: it means nothing matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(BucketKey, f64)>,
}

impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    pub fn from_points(name: impl Into<String>, points: Vec<(BucketKey, f64)>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn push(&mut self, x: impl Into<BucketKey>, y: f64) {
        self.points.push((x.into(), y));
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn xs(&self) -> Vec<BucketKey> {
        self.points.iter().map(|(x, _)| x.clone()).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|(_, y)| *y).collect()
    }

    pub fn get(&self, x: &BucketKey) -> Option<f64> {
        self.points.iter().find(|(k, _)| k == x).map(|(_, y)| *y)
    }

    pub fn max_y(&self) -> Option<f64> {
        self.points.iter().map(|(_, y)| *y).reduce(f64::max)
    }

    pub fn min_y(&self) -> Option<f64> {
        self.points.iter().map(|(_, y)| *y).reduce(f64::min)
    }

    /// Applies `f` to every y value.
    pub fn map_y(mut self, f: impl Fn(f64) -> f64) -> Self {
        for (_, y) in &mut self.points {
            *y = f(*y);
        }
        self
    }

    /// Re-keys the series onto `keys`, using `fill` where a key has no point.
    pub fn reindex(&self, keys: &[BucketKey], fill: f64) -> Series {
        let points = keys
            .iter()
            .map(|k| (k.clone(), self.get(k).unwrap_or(fill)))
            .collect();
        Series::from_points(self.name.clone(), points)
    }
}
