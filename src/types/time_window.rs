//! Resolves symbolic time-range tokens such as `h6` or `d30` into an absolute
//! `[start, end]` window ending at a caller-supplied "now".

use chrono::{DateTime, Months, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeWindowError {
    #[error("Invalid time token '{token}': {reason}")]
    InvalidTimeToken { token: String, reason: &'static str },
}

impl TimeWindowError {
    fn invalid(token: &str, reason: &'static str) -> Self {
        TimeWindowError::InvalidTimeToken {
            token: token.to_string(),
            reason,
        }
    }
}

/// The unit character leading a time token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowUnit {
    /// `m`
    Minute,
    /// `h`
    Hour,
    /// `d`
    Day,
    /// `o`, calendar months.
    Month,
}

impl WindowUnit {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'm' => Some(WindowUnit::Minute),
            'h' => Some(WindowUnit::Hour),
            'd' => Some(WindowUnit::Day),
            'o' => Some(WindowUnit::Month),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            WindowUnit::Minute => 'm',
            WindowUnit::Hour => 'h',
            WindowUnit::Day => 'd',
            WindowUnit::Month => 'o',
        }
    }
}

/// A parsed `<unit-char><integer>` token, independent of any point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowToken {
    pub unit: WindowUnit,
    pub amount: u32,
}

impl FromStr for WindowToken {
    type Err = TimeWindowError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mut chars = token.chars();
        let unit_char = chars
            .next()
            .ok_or_else(|| TimeWindowError::invalid(token, "token is empty"))?;
        let unit = WindowUnit::from_char(unit_char)
            .ok_or_else(|| TimeWindowError::invalid(token, "unrecognized unit character"))?;

        let digits = chars.as_str();
        // u32::from_str accepts a leading '+', the token grammar does not.
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimeWindowError::invalid(
                token,
                "amount must be an unsigned integer directly after the unit",
            ));
        }
        let amount: u32 = digits
            .parse()
            .map_err(|_| TimeWindowError::invalid(token, "amount is out of range"))?;
        if amount == 0 {
            return Err(TimeWindowError::invalid(token, "duration must be positive"));
        }
        Ok(WindowToken { unit, amount })
    }
}

impl fmt::Display for WindowToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.unit.as_char(), self.amount)
    }
}

impl WindowToken {
    /// Computes `now - self`. `None` when the subtraction leaves chrono's range.
    pub fn start_before(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let amount = i64::from(self.amount);
        let delta = match self.unit {
            WindowUnit::Minute => TimeDelta::try_minutes(amount),
            WindowUnit::Hour => TimeDelta::try_hours(amount),
            WindowUnit::Day => TimeDelta::try_days(amount),
            WindowUnit::Month => return now.checked_sub_months(Months::new(self.amount)),
        }?;
        now.checked_sub_signed(delta)
    }
}

/// An absolute time interval used to bound record queries.
///
/// A timestamp `t` belongs to the window when `start < t <= end`, which matches
/// how the dashboard collections are queried (strictly after the start, up to and
/// including now).
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use dashframe::TimeWindow;
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
/// let window = TimeWindow::resolve("h6", now).unwrap();
/// assert_eq!(window.end, now);
/// assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap());
///
/// assert!(TimeWindow::resolve("m:5", now).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Resolves `token` against the injected `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TimeWindowError::InvalidTimeToken`] when the unit character is not
    /// one of `m`, `h`, `d`, `o`, when the suffix is not a positive integer, or when
    /// the resulting start would fall outside the representable range.
    pub fn resolve(token: &str, now: DateTime<Utc>) -> Result<Self, TimeWindowError> {
        let parsed: WindowToken = token.parse()?;
        let start = parsed
            .start_before(now)
            .ok_or_else(|| {
                TimeWindowError::invalid(token, "duration exceeds the supported range")
            })?;
        Ok(TimeWindow { start, end: now })
    }

    /// Same as [`TimeWindow::resolve`] but reads the wall clock. Only meant for the
    /// outermost caller; everything below takes `now` explicitly.
    pub fn resolve_now(token: &str) -> Result<Self, TimeWindowError> {
        Self::resolve(token, Utc::now())
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start < t && t <= self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}
