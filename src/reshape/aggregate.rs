use serde::{Deserialize, Serialize};

/// How the values falling into one bucket collapse into a single number.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregator {
    #[default]
    Mean,
    Sum,
    Count,
    Min,
    Max,
    /// Last value in input order.
    Last,
    /// Quantile with linear interpolation between closest ranks, `p` in `[0, 1]`.
    Quantile(f64),
    /// Values are increments. Each bucket's total is clamped at zero and added to a
    /// running sum, so the resulting series never decreases.
    CumulativeSum,
}

impl Aggregator {
    /// Aggregators for which a bucket without data has a natural value of zero.
    pub fn zero_when_empty(&self) -> bool {
        matches!(
            self,
            Aggregator::Count | Aggregator::Sum | Aggregator::CumulativeSum
        )
    }

    /// Collapses one bucket. `None` means the bucket yields no point.
    pub(crate) fn bucket(&self, values: &[f64]) -> Option<f64> {
        match self {
            Aggregator::Count => Some(values.len() as f64),
            Aggregator::Sum | Aggregator::CumulativeSum => Some(values.iter().sum()),
            _ if values.is_empty() => None,
            Aggregator::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            Aggregator::Min => values.iter().copied().reduce(f64::min),
            Aggregator::Max => values.iter().copied().reduce(f64::max),
            Aggregator::Last => values.last().copied(),
            Aggregator::Quantile(p) => quantile(values, *p),
        }
    }

    /// Post-processing over the ordered bucket results.
    pub(crate) fn finish(&self, values: &mut [f64]) {
        if let Aggregator::CumulativeSum = self {
            let mut running = 0.0;
            for value in values.iter_mut() {
                running += value.max(0.0);
                *value = running;
            }
        }
    }
}

/// Quantile of `values` using linear interpolation between the two nearest ranks,
/// the same definition as numpy's default.
///
/// Returns `None` for an empty slice or a `p` outside `[0, 1]`.
///
/// # Examples
///
/// ```
/// use dashframe::quantile;
///
/// assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 0.5), Some(2.5));
/// assert_eq!(quantile(&[10.0, 20.0, 30.0, 40.0, 50.0], 0.25), Some(20.0));
/// assert_eq!(quantile(&[], 0.5), None);
/// ```
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_aggregators() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(Aggregator::Mean.bucket(&values), Some(2.5));
        assert_eq!(Aggregator::Sum.bucket(&values), Some(10.0));
        assert_eq!(Aggregator::Count.bucket(&values), Some(4.0));
        assert_eq!(Aggregator::Min.bucket(&values), Some(1.0));
        assert_eq!(Aggregator::Max.bucket(&values), Some(4.0));
        assert_eq!(Aggregator::Last.bucket(&values), Some(2.0));
        assert_eq!(Aggregator::Quantile(0.75).bucket(&values), Some(3.25));
    }

    #[test]
    fn test_empty_bucket() {
        assert_eq!(Aggregator::Count.bucket(&[]), Some(0.0));
        assert_eq!(Aggregator::Sum.bucket(&[]), Some(0.0));
        assert_eq!(Aggregator::Mean.bucket(&[]), None);
        assert_eq!(Aggregator::Quantile(0.5).bucket(&[]), None);
    }

    #[test]
    fn test_cumulative_sum_clamps_negative_increments() {
        let mut values = [10.0, -5.0, 3.0];
        Aggregator::CumulativeSum.finish(&mut values);
        assert_eq!(values, [10.0, 10.0, 13.0]);

        let mut untouched = [10.0, -5.0, 3.0];
        Aggregator::Sum.finish(&mut untouched);
        assert_eq!(untouched, [10.0, -5.0, 3.0]);
    }

    #[test]
    fn test_quantile_edges() {
        assert_eq!(quantile(&[7.0], 0.25), Some(7.0));
        assert_eq!(quantile(&[1.0, 9.0], 0.0), Some(1.0));
        assert_eq!(quantile(&[1.0, 9.0], 1.0), Some(9.0));
        assert_eq!(quantile(&[1.0, 9.0], 1.5), None);
        assert_eq!(quantile(&[1.0, 9.0], f64::NAN), None);
    }
}
