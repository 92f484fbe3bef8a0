//! Interquartile band of a value across neighbouring wells, per date.

use crate::reshape::aggregate::quantile;
use crate::types::observation::Observation;
use crate::types::series::{BucketKey, Series};
use crate::types::units::DAYS_PER_MONTH;
use std::collections::BTreeMap;

/// Per-date statistics over the wells of an offset group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfidenceBand {
    /// 75th percentile across wells.
    pub upper: Series,
    /// 25th percentile across wells.
    pub lower: Series,
    /// Number of wells reporting.
    pub count: Series,
    pub sum: Series,
    /// The subject well itself, only on dates where it reports.
    pub current: Series,
}

impl ConfidenceBand {
    pub fn is_empty(&self) -> bool {
        self.count.is_empty()
    }
}

/// Builds the band for `value_key` from monthly `(date, well, value)` records.
///
/// Values `<= 0` count as missing. Remaining values are converted from monthly
/// totals to daily averages (divided by [`DAYS_PER_MONTH`]); a well reporting
/// several values for the same date contributes their mean. Every date seen in
/// the input gets a point in `upper`, `lower`, `count` and `sum`, with `0` when no
/// well has a usable value.
pub fn offset_band(
    records: &[Observation],
    date_key: &str,
    well_key: &str,
    value_key: &str,
    current_well: &str,
) -> ConfidenceBand {
    let mut pivot: BTreeMap<BucketKey, BTreeMap<String, Vec<f64>>> = BTreeMap::new();
    for record in records {
        let (Some(date), Some(well)) = (record.timestamp(date_key), record.text(well_key)) else {
            continue;
        };
        let wells = pivot.entry(BucketKey::Timestamp(date)).or_default();
        let values = wells.entry(well.to_string()).or_default();
        if let Some(v) = record.number(value_key).filter(|v| *v > 0.0) {
            values.push(v / DAYS_PER_MONTH);
        }
    }

    let mut band = ConfidenceBand {
        upper: Series::new("offset_upper_75ci"),
        lower: Series::new("offset_lower_75ci"),
        count: Series::new("offset_count"),
        sum: Series::new("offset_sum"),
        current: Series::new("current_well"),
    };
    for (date, wells) in pivot {
        let well_means: BTreeMap<&str, f64> = wells
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(well, values)| {
                (well.as_str(), values.iter().sum::<f64>() / values.len() as f64)
            })
            .collect();
        let across: Vec<f64> = well_means.values().copied().collect();

        band.upper
            .push(date.clone(), quantile(&across, 0.75).unwrap_or(0.0));
        band.lower
            .push(date.clone(), quantile(&across, 0.25).unwrap_or(0.0));
        band.count.push(date.clone(), across.len() as f64);
        band.sum.push(date.clone(), across.iter().sum());
        if let Some(v) = well_means.get(current_well) {
            band.current.push(date, *v);
        }
    }
    band
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn monthly(month: u32, api: &str, oil: f64) -> Observation {
        Observation::new()
            .with("date", Utc.with_ymd_and_hms(2020, month, 1, 0, 0, 0).unwrap())
            .with("api", api)
            .with("oil", oil)
    }

    #[test]
    fn test_band_statistics() {
        let records = vec![
            monthly(1, "A", 30.45),
            monthly(1, "B", 60.9),
            monthly(1, "C", 91.35),
            monthly(1, "D", 121.8),
            monthly(1, "E", 0.0),
            monthly(2, "A", 0.0),
        ];
        let band = offset_band(&records, "date", "api", "oil", "B");

        assert_eq!(band.count.ys(), vec![4.0, 0.0]);
        let sum = band.sum.ys();
        assert!((sum[0] - 10.0).abs() < 1e-9);
        assert_eq!(sum[1], 0.0);
        assert!((band.upper.ys()[0] - 3.25).abs() < 1e-9);
        assert!((band.lower.ys()[0] - 1.75).abs() < 1e-9);
        assert_eq!(band.upper.ys()[1], 0.0);
        assert_eq!(band.lower.ys()[1], 0.0);

        assert_eq!(band.current.len(), 1);
        assert!((band.current.ys()[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_band_reads_text_dates() {
        let records = vec![
            Observation::new().with("date", "2020-01-01").with("api", "A").with("oil", 30.45),
            Observation::new()
                .with("date", "2020-02-01T00:00:00")
                .with("api", "A")
                .with("oil", 60.9),
        ];
        let band = offset_band(&records, "date", "api", "oil", "A");
        assert_eq!(band.count.ys(), vec![1.0, 1.0]);
        assert_eq!(
            band.current.xs(),
            vec![
                BucketKey::Timestamp(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
                BucketKey::Timestamp(Utc.with_ymd_and_hms(2020, 2, 1, 0, 0, 0).unwrap()),
            ]
        );
    }

    #[test]
    fn test_band_on_empty_input() {
        let band = offset_band(&[], "date", "api", "oil", "A");
        assert!(band.is_empty());
        assert!(band.current.is_empty());
    }
}
