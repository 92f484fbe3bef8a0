use serde::{Deserialize, Serialize};

/// Average number of days in a month. Monthly production totals are divided by
/// this to get a daily average.
pub const DAYS_PER_MONTH: f64 = 30.45;
pub const MPH_TO_KNOTS: f64 = 0.869;
pub const METERS_TO_FEET: f64 = 3.2808;
pub const KMH_TO_MPH: f64 = 0.621371;

/// A per-value unit normalization applied before aggregation.
///
/// # Examples
///
/// ```
/// use dashframe::{Conversion, DAYS_PER_MONTH};
///
/// let daily = Conversion::DivideBy(DAYS_PER_MONTH);
/// assert!((daily.apply(3045.0) - 100.0).abs() < 1e-9);
/// assert_eq!(Conversion::Identity.apply(7.0), 7.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conversion {
    #[default]
    Identity,
    Scale(f64),
    DivideBy(f64),
    Linear { scale: f64, offset: f64 },
}

impl Conversion {
    pub const MONTHLY_TO_DAILY: Conversion = Conversion::DivideBy(DAYS_PER_MONTH);
    pub const MPH_TO_KNOTS: Conversion = Conversion::Scale(MPH_TO_KNOTS);
    pub const METERS_TO_FEET: Conversion = Conversion::Scale(METERS_TO_FEET);
    pub const KMH_TO_MPH: Conversion = Conversion::Scale(KMH_TO_MPH);

    pub fn apply(&self, value: f64) -> f64 {
        match *self {
            Conversion::Identity => value,
            Conversion::Scale(factor) => value * factor,
            Conversion::DivideBy(divisor) => value / divisor,
            Conversion::Linear { scale, offset } => value * scale + offset,
        }
    }
}

/// Rounds to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
