use crate::types::observation::FieldValue;
use crate::types::series::BucketKey;
use chrono::{DateTime, TimeDelta, Utc};

/// Format of the labels produced by [`Grouping::Month`].
pub const MONTH_LABEL_FORMAT: &str = "%Y-%m";

/// Maps the raw group field of a record to its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Grouping {
    /// The field value itself: numbers, timestamps and text become the matching key.
    #[default]
    Exact,
    /// Nearest multiple of `resolution` (`1.0` rounds to whole numbers).
    Round { resolution: f64 },
    /// Floor to a multiple of `step`.
    Floor { step: f64 },
    /// Compass sector: the angle is wrapped into `[0, 360)` and floored to a
    /// multiple of `step`, so 359 falls in the 345 sector and 360 in the 0 sector
    /// for a 15 degree step.
    Compass { step: f64 },
    /// Timestamps floored to a multiple of the duration since the Unix epoch.
    Resample(TimeDelta),
    /// Timestamps as a `YYYY-MM` label.
    Month,
}

impl Grouping {
    /// The bucket of `value`, or `None` when the value cannot be grouped this way.
    pub fn key(&self, value: &FieldValue) -> Option<BucketKey> {
        match self {
            Grouping::Exact => exact_key(value),
            Grouping::Round { resolution } => {
                let v = value.as_f64()?;
                Some(BucketKey::number(snap(v, *resolution, f64::round)))
            }
            Grouping::Floor { step } => {
                let v = value.as_f64()?;
                Some(BucketKey::number(snap(v, *step, f64::floor)))
            }
            Grouping::Compass { step } => Some(BucketKey::number(compass_sector(
                value.as_f64()?,
                *step,
            ))),
            Grouping::Resample(period) => {
                resample(value.as_timestamp()?, *period).map(BucketKey::Timestamp)
            }
            Grouping::Month => Some(BucketKey::Label(
                value.as_timestamp()?.format(MONTH_LABEL_FORMAT).to_string(),
            )),
        }
    }
}

fn exact_key(value: &FieldValue) -> Option<BucketKey> {
    match value {
        FieldValue::Number(n) if n.is_finite() => Some(BucketKey::number(*n)),
        FieldValue::Timestamp(t) => Some(BucketKey::Timestamp(*t)),
        FieldValue::Text(s) => Some(match value.as_timestamp() {
            Some(t) => BucketKey::Timestamp(t),
            None => BucketKey::Label(s.clone()),
        }),
        FieldValue::Bool(b) => Some(BucketKey::Label(b.to_string())),
        FieldValue::Document(_) => value.as_timestamp().map(BucketKey::Timestamp),
        _ => None,
    }
}

fn snap(value: f64, step: f64, op: fn(f64) -> f64) -> f64 {
    if step > 0.0 && step.is_finite() {
        let snapped = op(value / step) * step;
        // Avoid "-0" keys next to "0" keys.
        if snapped == 0.0 {
            0.0
        } else {
            snapped
        }
    } else {
        op(value)
    }
}

/// Sector of `degrees` for a compass rose split into `step` degree slices.
///
/// # Examples
///
/// ```
/// use dashframe::compass_sector;
///
/// assert_eq!(compass_sector(359.0, 15.0), 345.0);
/// assert_eq!(compass_sector(360.0, 15.0), 0.0);
/// assert_eq!(compass_sector(-10.0, 15.0), 345.0);
/// ```
pub fn compass_sector(degrees: f64, step: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    let sector = snap(wrapped, step, f64::floor);
    if sector >= 360.0 {
        0.0
    } else {
        sector
    }
}

fn resample(t: DateTime<Utc>, period: TimeDelta) -> Option<DateTime<Utc>> {
    let period_ms = period.num_milliseconds();
    if period_ms <= 0 {
        return None;
    }
    let floored = t.timestamp_millis().div_euclid(period_ms) * period_ms;
    DateTime::from_timestamp_millis(floored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::observation::Observation;
    use chrono::TimeZone;

    #[test]
    fn test_compass_binning() {
        let g = Grouping::Compass { step: 15.0 };
        let cases = [
            (0.0, 0.0),
            (14.9, 0.0),
            (15.0, 15.0),
            (180.0, 180.0),
            (359.0, 345.0),
            (360.0, 0.0),
            (375.0, 15.0),
        ];
        for (deg, sector) in cases {
            assert_eq!(
                g.key(&FieldValue::Number(deg)),
                Some(BucketKey::number(sector)),
                "{deg} degrees"
            );
        }
    }

    #[test]
    fn test_exact_keys_read_text_dates_as_timestamps() {
        let midnight = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let exact = Grouping::Exact;
        assert_eq!(
            exact.key(&FieldValue::from("2020-01-01")),
            Some(BucketKey::Timestamp(midnight))
        );
        let mongo = Observation::new().with("$date", midnight);
        assert_eq!(
            exact.key(&FieldValue::Document(mongo)),
            Some(BucketKey::Timestamp(midnight))
        );
        assert_eq!(exact.key(&FieldValue::from("VFR")), Some(BucketKey::label("VFR")));
    }

    #[test]
    fn test_round_and_floor() {
        let round = Grouping::Round { resolution: 1.0 };
        assert_eq!(round.key(&FieldValue::Number(12.6)), Some(BucketKey::number(13.0)));
        assert_eq!(round.key(&FieldValue::Number(-0.2)), Some(BucketKey::number(0.0)));
        let tenth = Grouping::Round { resolution: 0.1 };
        let key = tenth.key(&FieldValue::Number(3.14159)).unwrap();
        assert!((key.as_f64().unwrap() - 3.1).abs() < 1e-12);

        let floor = Grouping::Floor { step: 5.0 };
        assert_eq!(floor.key(&FieldValue::Number(9.99)), Some(BucketKey::number(5.0)));
        assert_eq!(floor.key(&FieldValue::from("abc")), None);
    }

    #[test]
    fn test_resample_and_month() {
        let t = Utc.with_ymd_and_hms(2024, 7, 4, 13, 47, 12).unwrap();
        let five = Grouping::Resample(TimeDelta::minutes(5));
        assert_eq!(
            five.key(&FieldValue::Timestamp(t)),
            Some(BucketKey::Timestamp(
                Utc.with_ymd_and_hms(2024, 7, 4, 13, 45, 0).unwrap()
            ))
        );
        assert_eq!(
            Grouping::Month.key(&FieldValue::Timestamp(t)),
            Some(BucketKey::label("2024-07"))
        );
        assert_eq!(Grouping::Month.key(&FieldValue::Number(1.0)), None);
        assert_eq!(Grouping::Resample(TimeDelta::zero()).key(&FieldValue::Timestamp(t)), None);
    }

    #[test]
    fn test_exact_keys() {
        assert_eq!(Grouping::Exact.key(&FieldValue::from("N")), Some(BucketKey::label("N")));
        assert_eq!(Grouping::Exact.key(&FieldValue::Number(2.0)), Some(BucketKey::number(2.0)));
        assert_eq!(Grouping::Exact.key(&FieldValue::Null), None);
    }
}
