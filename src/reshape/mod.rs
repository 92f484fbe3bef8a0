//! Turns loosely-typed observations into display-ready [`Series`].
//!
//! The central entry point is [`reshape_with`], a builder over the steps every
//! panel shares: read the group and value fields, drop sensor-fault sentinels,
//! normalize units, bucket, aggregate and order. [`reshape`] is the short form with
//! exact grouping and ascending order.

pub mod aggregate;
pub mod band;
pub mod deltas;
pub mod derived;
pub mod grouping;
pub mod wind_rose;

use crate::types::observation::Observation;
use crate::types::series::{BucketKey, Series};
use crate::types::units::Conversion;
use aggregate::Aggregator;
use bon::builder;
use grouping::Grouping;
use std::collections::BTreeMap;
use std::ops::{Bound, RangeBounds};

/// Accepted range of raw values. Values outside are treated as missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueBounds {
    pub lower: Bound<f64>,
    pub upper: Bound<f64>,
}

impl Default for ValueBounds {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

impl ValueBounds {
    pub const UNBOUNDED: ValueBounds = ValueBounds {
        lower: Bound::Unbounded,
        upper: Bound::Unbounded,
    };

    /// Weather stations report `-9999` and similar for a faulted sensor; anything
    /// below `-50` is one of those.
    pub const SENSOR_FAULT: ValueBounds = ValueBounds {
        lower: Bound::Included(-50.0),
        upper: Bound::Unbounded,
    };

    /// Exclusive on both ends.
    pub fn open(lower: f64, upper: f64) -> Self {
        Self {
            lower: Bound::Excluded(lower),
            upper: Bound::Excluded(upper),
        }
    }

    pub fn at_least(lower: f64) -> Self {
        Self {
            lower: Bound::Included(lower),
            upper: Bound::Unbounded,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        !value.is_nan() && RangeBounds::contains(&(self.lower, self.upper), &value)
    }
}

/// Order of the emitted buckets.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BucketOrder {
    /// Ascending by key.
    #[default]
    Ascending,
    /// Exactly these keys, in this order. Keys outside the list are dropped. A
    /// category without data is emitted as `0` when the aggregator has a natural
    /// zero (`Count`, `Sum`, `CumulativeSum`) and omitted otherwise.
    Categories(Vec<BucketKey>),
}

/// Groups `records` by `group_key` and aggregates `value_key` per group.
///
/// Equivalent to [`reshape_with`] with exact grouping, no unit conversion, no
/// value bounds and ascending bucket order.
///
/// # Examples
///
/// ```
/// use dashframe::{reshape, Aggregator, Observation};
///
/// let records = vec![
///     Observation::new().with("distance", 3.0).with("count", 1.0),
///     Observation::new().with("distance", 1.0).with("count", 1.0),
///     Observation::new().with("distance", 3.0).with("count", 1.0),
///     Observation::new().with("distance", 2.0),
/// ];
/// let series = reshape(&records, "distance", "count", Aggregator::Sum);
/// assert_eq!(series.ys(), vec![1.0, 2.0]);
/// ```
pub fn reshape(
    records: &[Observation],
    group_key: &str,
    value_key: &str,
    aggregator: Aggregator,
) -> Series {
    reshape_with(records)
        .group_key(group_key)
        .value_key(value_key)
        .aggregator(aggregator)
        .call()
}

/// Builder form of [`reshape`].
///
/// # Arguments (Initial Builder Method)
///
/// * `records` - The observations to reshape. Order only matters for
///   [`Aggregator::Last`].
///
/// # Builder Methods
///
/// * `.group_key(&str)` (required): field (dotted paths allowed) whose value picks
///   the bucket.
/// * `.value_key(&str)` (required): numeric field being aggregated.
/// * `.aggregator(Aggregator)`: defaults to [`Aggregator::Mean`].
/// * `.grouping(Grouping)`: defaults to [`Grouping::Exact`].
/// * `.order(BucketOrder)`: defaults to [`BucketOrder::Ascending`].
/// * `.conversion(Conversion)`: applied to each raw value after the bounds check.
/// * `.bounds(ValueBounds)`: raw values outside are dropped before aggregation.
/// * `.name(..)`: series name, defaults to `value_key`.
///
/// # Returns
///
/// The aggregated [`Series`]. Records lacking either field, or whose value is not
/// numeric, do not contribute. An empty series is returned when nothing remains.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use dashframe::{reshape_with, Aggregator, Grouping, Observation, ValueBounds};
///
/// let t = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
/// let records = vec![
///     Observation::new().with("t", t(1)).with("temp_f", 60.0),
///     Observation::new().with("t", t(1)).with("temp_f", -9999.0),
///     Observation::new().with("t", t(2)).with("temp_f", 64.0),
/// ];
/// let series = reshape_with(&records)
///     .group_key("t")
///     .value_key("temp_f")
///     .grouping(Grouping::Month)
///     .bounds(ValueBounds::SENSOR_FAULT)
///     .aggregator(Aggregator::Mean)
///     .call();
/// assert_eq!(series.ys(), vec![62.0]);
/// ```
#[builder]
pub fn reshape_with(
    #[builder(start_fn)] records: &[Observation],
    group_key: &str,
    value_key: &str,
    aggregator: Option<Aggregator>,
    grouping: Option<Grouping>,
    order: Option<BucketOrder>,
    conversion: Option<Conversion>,
    bounds: Option<ValueBounds>,
    #[builder(into)] name: Option<String>,
) -> Series {
    let aggregator = aggregator.unwrap_or_default();
    let grouping = grouping.unwrap_or_default();
    let conversion = conversion.unwrap_or_default();
    let bounds = bounds.unwrap_or_default();
    let name = name.unwrap_or_else(|| value_key.to_string());

    let mut buckets: BTreeMap<BucketKey, Vec<f64>> = BTreeMap::new();
    for record in records {
        let Some(key) = record.lookup(group_key).and_then(|v| grouping.key(v)) else {
            continue;
        };
        let Some(raw) = record.number(value_key) else {
            continue;
        };
        if !bounds.contains(raw) {
            continue;
        }
        let value = conversion.apply(raw);
        if value.is_finite() {
            buckets.entry(key).or_default().push(value);
        }
    }

    let mut points: Vec<(BucketKey, f64)> = match order.unwrap_or_default() {
        BucketOrder::Ascending => buckets
            .into_iter()
            .filter_map(|(key, values)| aggregator.bucket(&values).map(|y| (key, y)))
            .collect(),
        BucketOrder::Categories(categories) => categories
            .into_iter()
            .filter_map(|key| {
                let y = match buckets.get(&key) {
                    Some(values) => aggregator.bucket(values),
                    None if aggregator.zero_when_empty() => Some(0.0),
                    None => None,
                };
                y.map(|y| (key, y))
            })
            .collect(),
    };

    let mut ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
    aggregator.finish(&mut ys);
    for ((_, y), finished) in points.iter_mut().zip(ys) {
        *y = finished;
    }
    Series::from_points(name, points)
}

/// Splits `records` into groups keyed by `grouping` applied to `key`, ascending.
/// Records without a usable key are left out.
pub fn partition<'a>(
    records: &'a [Observation],
    key: &str,
    grouping: Grouping,
) -> BTreeMap<BucketKey, Vec<&'a Observation>> {
    let mut groups: BTreeMap<BucketKey, Vec<&'a Observation>> = BTreeMap::new();
    for record in records {
        if let Some(bucket) = record.lookup(key).and_then(|v| grouping.key(v)) {
            groups.entry(bucket).or_default().push(record);
        }
    }
    groups
}

/// Chunks `items` into rows of at most `width` elements. A zero width puts
/// everything in one row.
///
/// # Examples
///
/// ```
/// use dashframe::grid_rows;
///
/// let rows = grid_rows(vec![1, 2, 3, 4, 5], 2);
/// assert_eq!(rows, vec![vec![1, 2], vec![3, 4], vec![5]]);
/// ```
pub fn grid_rows<T>(items: Vec<T>, width: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    if width == 0 {
        return vec![items];
    }
    let mut rows = Vec::with_capacity(items.len().div_ceil(width));
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        rows.push(iter.by_ref().take(width).collect());
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn reading(group: f64, value: f64) -> Observation {
        Observation::new().with("g", group).with("v", value)
    }

    #[test]
    fn test_empty_input_gives_empty_series() {
        let series = reshape(&[], "g", "v", Aggregator::Mean);
        assert!(series.is_empty());
        assert_eq!(series.name, "v");
    }

    #[test]
    fn test_missing_fields_are_excluded_per_field() {
        let records = vec![
            reading(1.0, 2.0),
            Observation::new().with("g", 1.0),
            Observation::new().with("v", 9.0),
            Observation::new().with("g", 1.0).with("v", "n/a"),
            reading(1.0, 4.0),
        ];
        let series = reshape(&records, "g", "v", Aggregator::Mean);
        assert_eq!(series.points, vec![(BucketKey::number(1.0), 3.0)]);
    }

    #[test]
    fn test_cumulative_sum_over_increments() {
        let records = vec![reading(1.0, 10.0), reading(2.0, -5.0), reading(3.0, 3.0)];
        let series = reshape(&records, "g", "v", Aggregator::CumulativeSum);
        assert_eq!(series.ys(), vec![10.0, 10.0, 13.0]);
        assert!(series.ys().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_sensor_fault_bounds_and_conversion() {
        let records = vec![reading(1.0, -9999.0), reading(1.0, 10.0), reading(1.0, -50.0)];
        let series = reshape_with(&records)
            .group_key("g")
            .value_key("v")
            .bounds(ValueBounds::SENSOR_FAULT)
            .conversion(Conversion::Scale(2.0))
            .aggregator(Aggregator::Sum)
            .name("doubled")
            .call();
        assert_eq!(series.name, "doubled");
        assert_eq!(series.ys(), vec![-80.0]);
    }

    #[test]
    fn test_open_bounds() {
        let bounds = ValueBounds::open(-9999.0, 9999.0);
        assert!(!bounds.contains(-9999.0));
        assert!(bounds.contains(0.0));
        assert!(!bounds.contains(f64::NAN));
        assert!(ValueBounds::UNBOUNDED.contains(f64::INFINITY));
    }

    #[test]
    fn test_category_order_fills_counts_and_drops_strays() {
        let records = vec![
            Observation::new().with("cat", "b").with("v", 1.0),
            Observation::new().with("cat", "b").with("v", 1.0),
            Observation::new().with("cat", "zzz").with("v", 1.0),
        ];
        let order = BucketOrder::Categories(vec![BucketKey::label("a"), BucketKey::label("b")]);

        let counts = reshape_with(&records)
            .group_key("cat")
            .value_key("v")
            .aggregator(Aggregator::Count)
            .order(order.clone())
            .call();
        assert_eq!(
            counts.points,
            vec![(BucketKey::label("a"), 0.0), (BucketKey::label("b"), 2.0)]
        );

        let means = reshape_with(&records)
            .group_key("cat")
            .value_key("v")
            .order(order)
            .call();
        assert_eq!(means.points, vec![(BucketKey::label("b"), 1.0)]);
    }

    #[test]
    fn test_resampled_time_series() {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let records: Vec<Observation> = (0..12)
            .map(|i| {
                Observation::new()
                    .with("t", base + TimeDelta::minutes(i * 10))
                    .with("v", i as f64)
            })
            .collect();
        let series = reshape_with(&records)
            .group_key("t")
            .value_key("v")
            .grouping(Grouping::Resample(TimeDelta::hours(1)))
            .aggregator(Aggregator::Max)
            .call();
        assert_eq!(series.ys(), vec![5.0, 11.0]);
        assert_eq!(series.points[0].0, BucketKey::Timestamp(base));
    }

    #[test]
    fn test_partition_by_month() {
        let records = vec![
            Observation::new().with("t", Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()),
            Observation::new().with("t", Utc.with_ymd_and_hms(2024, 2, 5, 0, 0, 0).unwrap()),
            Observation::new().with("t", Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap()),
            Observation::new(),
        ];
        let groups = partition(&records, "t", Grouping::Month);
        let sizes: Vec<(String, usize)> = groups
            .iter()
            .map(|(k, v)| (k.to_string(), v.len()))
            .collect();
        assert_eq!(sizes, vec![("2024-01".to_string(), 2), ("2024-02".to_string(), 1)]);
    }

    #[test]
    fn test_grid_rows_edges() {
        assert!(grid_rows(Vec::<u8>::new(), 3).is_empty());
        assert_eq!(grid_rows(vec![1, 2], 0), vec![vec![1, 2]]);
        assert_eq!(grid_rows(vec![1, 2, 3], 3), vec![vec![1, 2, 3]]);
    }
}
