//! Loosely-typed documents as they come out of the dashboard collections.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A single scalar or nested value of an [`Observation`].
///
/// Deserialization is untagged: JSON `null`, booleans, numbers, arrays and objects
/// map to the obvious variants, and strings become [`FieldValue::Timestamp`] when
/// they parse as RFC 3339, [`FieldValue::Text`] otherwise. Text and extended-JSON
/// `{"$date": ..}` documents are still read as timestamps by
/// [`FieldValue::as_timestamp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
    List(Vec<FieldValue>),
    Document(Observation),
}

impl FieldValue {
    /// Numeric view of the value. Numeric text is parsed, everything else is `None`.
    /// Non-finite numbers are treated as missing.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        value.is_finite().then_some(value)
    }

    /// Timestamp view of the value.
    ///
    /// Text is accepted as RFC 3339, RFC 2822, a naive date-time or a plain date;
    /// naive values are taken as UTC. A `{"$date": ..}` document, as written by
    /// `mongoexport`, holds either such text or epoch milliseconds (possibly as
    /// `{"$numberLong": ".."}`).
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(t) => Some(*t),
            FieldValue::Text(s) => parse_timestamp(s),
            FieldValue::Document(doc) if doc.len() == 1 => match doc.get("$date")? {
                FieldValue::Number(ms) => DateTime::from_timestamp_millis(*ms as i64),
                FieldValue::Document(long) => {
                    let ms = long.text("$numberLong")?.parse().ok()?;
                    DateTime::from_timestamp_millis(ms)
                }
                date => date.as_timestamp(),
            },
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Orders two values of compatible kinds. Numbers compare with numbers (numeric
    /// text included), timestamps with timestamps, text with text.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Some(a.cmp(b)),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            (FieldValue::Timestamp(_) | FieldValue::Document(_), _)
            | (_, FieldValue::Timestamp(_) | FieldValue::Document(_)) => {
                Some(self.as_timestamp()?.cmp(&other.as_timestamp()?))
            }
            _ => {
                let a = self.as_f64()?;
                let b = other.as_f64()?;
                a.partial_cmp(&b)
            }
        }
    }
}

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(t) = text.parse::<DateTime<Utc>>() {
        return Some(t);
    }
    if let Ok(t) = DateTime::parse_from_rfc2822(text) {
        return Some(t.to_utc());
    }
    if let Some(t) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Some(t.and_utc());
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Observation> for FieldValue {
    fn from(value: Observation) -> Self {
        FieldValue::Document(value)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// One raw document: a weather reading, a position report, a well header, a
/// gallery. Fields are optional by nature; accessors return `None` for absent or
/// unusable values and callers exclude the record for that field only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Observation {
    fields: BTreeMap<String, FieldValue>,
}

impl Observation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for tests and in-memory sources.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Looks up a dotted path (`location.latitude`) through nested documents.
    pub fn lookup(&self, path: &str) -> Option<&FieldValue> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            match current {
                FieldValue::Document(doc) => current = doc.fields.get(part)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// `true` when the path exists and is not null.
    pub fn has(&self, path: &str) -> bool {
        self.lookup(path).is_some_and(|v| !v.is_null())
    }

    pub fn number(&self, path: &str) -> Option<f64> {
        self.lookup(path).and_then(FieldValue::as_f64)
    }

    /// Numeric value with missing fields read as zero.
    pub fn number_or_zero(&self, path: &str) -> f64 {
        self.number(path).unwrap_or(0.0)
    }

    pub fn timestamp(&self, path: &str) -> Option<DateTime<Utc>> {
        self.lookup(path).and_then(FieldValue::as_timestamp)
    }

    pub fn text(&self, path: &str) -> Option<&str> {
        self.lookup(path).and_then(FieldValue::as_str)
    }

    pub fn document(&self, path: &str) -> Option<&Observation> {
        match self.lookup(path)? {
            FieldValue::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn list(&self, path: &str) -> Option<&[FieldValue]> {
        match self.lookup(path)? {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Nested documents of a list field, skipping non-document entries.
    pub fn documents(&self, path: &str) -> impl Iterator<Item = &Observation> {
        self.list(path).into_iter().flatten().filter_map(|v| match v {
            FieldValue::Document(doc) => Some(doc),
            _ => None,
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Observation {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Observation {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
