//! Point-to-point differences over an already ordered series.

use crate::reshape::aggregate::Aggregator;
use crate::types::series::Series;
use chrono::TimeDelta;

/// Difference from the previous point. The first point has no predecessor and
/// becomes `0`.
pub fn deltas(series: &Series) -> Series {
    let mut previous: Option<f64> = None;
    let points = series
        .points
        .iter()
        .map(|(x, y)| {
            let delta = previous.map_or(0.0, |p| y - p);
            previous = Some(*y);
            (x.clone(), delta)
        })
        .collect();
    Series::from_points(series.name.clone(), points)
}

/// Change per `per` between consecutive timestamped points (e.g. degrees per hour).
///
/// The first point, points whose key is not a timestamp, and pairs without a
/// positive time step yield no output point.
pub fn rate_per(series: &Series, per: TimeDelta) -> Series {
    let per_ms = per.num_milliseconds() as f64;
    let mut out = Series::new(series.name.clone());
    if per_ms <= 0.0 {
        return out;
    }
    for pair in series.points.windows(2) {
        let [(x0, y0), (x1, y1)] = pair else {
            continue;
        };
        let (Some(t0), Some(t1)) = (x0.as_timestamp(), x1.as_timestamp()) else {
            continue;
        };
        let elapsed_ms = (t1 - t0).num_milliseconds() as f64;
        if elapsed_ms > 0.0 {
            out.points
                .push((x1.clone(), (y1 - y0) / (elapsed_ms / per_ms)));
        }
    }
    out
}

/// Running total of a counter that can reset (e.g. "precipitation today").
/// Negative steps are treated as resets and contribute nothing, so the result
/// never decreases. Starts at `0`.
///
/// # Examples
///
/// ```
/// use dashframe::{accumulate_counter, Series};
///
/// let mut today = Series::new("precip_today_in");
/// for (i, v) in [0.1, 0.3, 0.3, 0.0, 0.2].into_iter().enumerate() {
///     today.push(i as f64, v);
/// }
/// let total = accumulate_counter(&today);
/// let ys: Vec<f64> = total.ys().iter().map(|y| (y * 100.0).round() / 100.0).collect();
/// assert_eq!(ys, vec![0.0, 0.2, 0.2, 0.2, 0.4]);
/// ```
pub fn accumulate_counter(series: &Series) -> Series {
    let mut steps = deltas(series);
    let mut ys = steps.ys();
    Aggregator::CumulativeSum.finish(&mut ys);
    for ((_, y), total) in steps.points.iter_mut().zip(ys) {
        *y = total;
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::series::BucketKey;
    use chrono::{TimeZone, Utc};

    fn timed(values: &[(u32, f64)]) -> Series {
        let mut s = Series::new("temp_f");
        for (minute, v) in values {
            s.push(Utc.with_ymd_and_hms(2024, 1, 1, 0, *minute, 0).unwrap(), *v);
        }
        s
    }

    #[test]
    fn test_deltas() {
        let mut s = Series::new("x");
        for (i, v) in [10.0, -5.0, 3.0].into_iter().enumerate() {
            s.push(i as f64, v);
        }
        assert_eq!(deltas(&s).ys(), vec![0.0, -15.0, 8.0]);
        assert!(deltas(&Series::new("x")).is_empty());
    }

    #[test]
    fn test_rate_per_hour() {
        let s = timed(&[(0, 50.0), (30, 51.0), (45, 50.0)]);
        let rate = rate_per(&s, TimeDelta::hours(1));
        assert_eq!(rate.ys(), vec![2.0, -4.0]);
        assert_eq!(
            rate.points[0].0,
            BucketKey::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_rate_per_skips_duplicate_timestamps() {
        let s = timed(&[(0, 1.0), (0, 2.0), (10, 3.0)]);
        let rate = rate_per(&s, TimeDelta::minutes(1));
        assert_eq!(rate.ys(), vec![0.1]);
    }

    #[test]
    fn test_counter_reset_never_decreases_total() {
        let s = timed(&[(0, 0.5), (5, 0.7), (10, 0.0), (15, 0.1)]);
        let total = accumulate_counter(&s);
        let ys = total.ys();
        assert!(ys.windows(2).all(|w| w[0] <= w[1]));
        assert!((ys[3] - 0.3).abs() < 1e-12);
    }
}
