//! Opaque-read queries against a document collection.

use crate::types::observation::{FieldValue, Observation};
use crate::types::time_window::TimeWindow;
use std::cmp::Ordering;

/// A predicate on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    Eq(FieldValue),
    In(Vec<FieldValue>),
    /// `Exists(true)` requires a non-null value, `Exists(false)` its absence.
    Exists(bool),
    Gt(FieldValue),
    Gte(FieldValue),
    Lt(FieldValue),
    Lte(FieldValue),
}

impl FieldFilter {
    pub fn matches(&self, value: Option<&FieldValue>) -> bool {
        let present = value.filter(|v| !v.is_null());
        match self {
            FieldFilter::Exists(expected) => present.is_some() == *expected,
            FieldFilter::Eq(target) => present.is_some_and(|v| same(v, target)),
            FieldFilter::In(targets) => present.is_some_and(|v| targets.iter().any(|t| same(v, t))),
            FieldFilter::Gt(bound) => ordered(present, bound, |o| o == Ordering::Greater),
            FieldFilter::Gte(bound) => ordered(present, bound, |o| o != Ordering::Less),
            FieldFilter::Lt(bound) => ordered(present, bound, |o| o == Ordering::Less),
            FieldFilter::Lte(bound) => ordered(present, bound, |o| o != Ordering::Greater),
        }
    }
}

fn same(value: &FieldValue, target: &FieldValue) -> bool {
    value == target || value.compare(target) == Some(Ordering::Equal)
}

fn ordered(value: Option<&FieldValue>, bound: &FieldValue, accept: fn(Ordering) -> bool) -> bool {
    value
        .and_then(|v| v.compare(bound))
        .is_some_and(accept)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// What to read from a collection: filters (all must match), an optional sort,
/// an optional limit applied after sorting, and fields to strip from the results.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use dashframe::{FieldFilter, RecordQuery, SortOrder, TimeWindow};
///
/// let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let window = TimeWindow::resolve("d1", now).unwrap();
/// let query = RecordQuery::new("wx.raw")
///     .filter("station_id", FieldFilter::Eq("KTXHOUST1".into()))
///     .within("observation_time_rfc822", &window)
///     .sort("observation_time_rfc822", SortOrder::Descending)
///     .exclude("_id");
/// assert_eq!(query.filters.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordQuery {
    pub collection: String,
    pub filters: Vec<(String, FieldFilter)>,
    pub sort: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
    pub exclude: Vec<String>,
}

impl RecordQuery {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    pub fn filter(mut self, field: impl Into<String>, filter: FieldFilter) -> Self {
        self.filters.push((field.into(), filter));
        self
    }

    /// `start < field <= end`.
    pub fn within(self, field: &str, window: &TimeWindow) -> Self {
        self.filter(field, FieldFilter::Gt(window.start.into()))
            .filter(field, FieldFilter::Lte(window.end.into()))
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((field.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn exclude(mut self, field: impl Into<String>) -> Self {
        self.exclude.push(field.into());
        self
    }

    pub fn matches(&self, record: &Observation) -> bool {
        self.filters
            .iter()
            .all(|(field, filter)| filter.matches(record.lookup(field)))
    }

    /// Runs the query over an in-memory collection. Sorting is stable and puts
    /// records lacking the sort field last in either order.
    pub fn apply<I>(&self, records: I) -> Vec<Observation>
    where
        I: IntoIterator<Item = Observation>,
    {
        let mut selected: Vec<Observation> =
            records.into_iter().filter(|r| self.matches(r)).collect();

        if let Some((field, order)) = &self.sort {
            selected.sort_by(|a, b| match (a.lookup(field), b.lookup(field)) {
                (Some(x), Some(y)) => {
                    let ord = x.compare(y).unwrap_or(Ordering::Equal);
                    match order {
                        SortOrder::Ascending => ord,
                        SortOrder::Descending => ord.reverse(),
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
        }
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        if !self.exclude.is_empty() {
            for record in selected.iter_mut() {
                for field in &self.exclude {
                    record.remove(field);
                }
            }
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    #[test]
    fn test_filters() {
        let v = FieldValue::Number(5.0);
        assert!(FieldFilter::Eq(5.0.into()).matches(Some(&v)));
        assert!(FieldFilter::Eq("5".into()).matches(Some(&v)));
        assert!(FieldFilter::In(vec![1.0.into(), 5.0.into()]).matches(Some(&v)));
        assert!(FieldFilter::Gt(4.0.into()).matches(Some(&v)));
        assert!(!FieldFilter::Gt(5.0.into()).matches(Some(&v)));
        assert!(FieldFilter::Gte(5.0.into()).matches(Some(&v)));
        assert!(FieldFilter::Lte(5.0.into()).matches(Some(&v)));
        assert!(!FieldFilter::Lt(5.0.into()).matches(Some(&v)));
        assert!(FieldFilter::Exists(true).matches(Some(&v)));
        assert!(!FieldFilter::Exists(true).matches(Some(&FieldValue::Null)));
        assert!(FieldFilter::Exists(false).matches(None));
        assert!(!FieldFilter::Gt(1.0.into()).matches(None));
        assert!(!FieldFilter::Gt(1.0.into()).matches(Some(&FieldValue::from("x"))));
    }

    #[test]
    fn test_within_window_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let window = TimeWindow::resolve("h1", now).unwrap();
        let query = RecordQuery::new("iot.raw").within("timestamp_", &window);
        let at = |t| Observation::new().with("timestamp_", t);

        assert!(!query.matches(&at(window.start)));
        assert!(query.matches(&at(window.start + TimeDelta::seconds(1))));
        assert!(query.matches(&at(now)));
        assert!(!query.matches(&at(now + TimeDelta::seconds(1))));
        assert!(!query.matches(&Observation::new()));
    }

    #[test]
    fn test_apply_sorts_limits_and_excludes() {
        let records = vec![
            Observation::new().with("_id", "a").with("n", 2.0),
            Observation::new().with("_id", "b"),
            Observation::new().with("_id", "c").with("n", 9.0),
            Observation::new().with("_id", "d").with("n", 5.0),
        ];
        let query = RecordQuery::new("x")
            .sort("n", SortOrder::Descending)
            .limit(3)
            .exclude("_id");
        let out = query.apply(records);
        let ns: Vec<Option<f64>> = out.iter().map(|r| r.number("n")).collect();
        assert_eq!(ns, vec![Some(9.0), Some(5.0), Some(2.0)]);
        assert!(out.iter().all(|r| !r.has("_id")));
    }

    #[test]
    fn test_nested_field_filter() {
        let record: Observation =
            serde_json::from_str(r#"{"location": {"latitude": 35.2}}"#).unwrap();
        let query =
            RecordQuery::new("photos").filter("location.latitude", FieldFilter::Exists(true));
        assert!(query.matches(&record));
    }
}
