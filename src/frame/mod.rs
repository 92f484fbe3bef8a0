//! Bridges observations into polars frames, and the lazy-frame filters the
//! tabular reshapes are built from.

pub mod surface;

use crate::types::observation::Observation;
use crate::types::time_window::TimeWindow;
use polars::prelude::{
    col, lit, Column, DataFrame, DataType, IntoColumn, LazyFrame, NamedFrom, PolarsResult,
    Series as PlSeries, TimeUnit,
};

/// How a record field is materialized as a frame column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// `Float64`; non-numeric values become null.
    Number,
    /// `Datetime(ms)` in UTC.
    Timestamp,
    /// `String`; only text fields are kept.
    Text,
}

/// Materializes `columns` of `records` into a [`DataFrame`], one row per record.
/// Missing or unusable fields become nulls.
///
/// # Errors
///
/// Returns a `PolarsError` if the frame cannot be assembled (e.g. duplicate column
/// names).
pub fn records_to_frame(
    records: &[Observation],
    columns: &[(&str, ColumnKind)],
) -> PolarsResult<DataFrame> {
    let mut frame_columns: Vec<Column> = Vec::with_capacity(columns.len());
    for (name, kind) in columns {
        let column = match kind {
            ColumnKind::Number => {
                let values: Vec<Option<f64>> = records.iter().map(|r| r.number(name)).collect();
                Column::new((*name).into(), values)
            }
            ColumnKind::Timestamp => {
                let millis: Vec<Option<i64>> = records
                    .iter()
                    .map(|r| r.timestamp(name).map(|t| t.timestamp_millis()))
                    .collect();
                PlSeries::new((*name).into(), millis)
                    .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                    .into_column()
            }
            ColumnKind::Text => {
                let values: Vec<Option<&str>> = records.iter().map(|r| r.text(name)).collect();
                Column::new((*name).into(), values)
            }
        };
        frame_columns.push(column);
    }
    DataFrame::new(frame_columns)
}

pub trait ObservationFrameExt {
    /// Keeps rows whose `column` timestamp lies in the window (`start < t <= end`).
    ///
    /// # Returns
    /// A new `LazyFrame` with the filter applied. Type errors surface on `collect`.
    fn filter_window(self, column: &str, window: &TimeWindow) -> LazyFrame;

    /// Keeps rows where every one of `columns` lies strictly between `lower` and
    /// `upper`. Nulls are dropped.
    fn within_bounds(self, columns: &[&str], lower: f64, upper: f64) -> LazyFrame;

    /// Rounds the numeric `columns` to `decimals` places in place.
    fn round_columns(self, columns: &[&str], decimals: u32) -> LazyFrame;
}

impl ObservationFrameExt for LazyFrame {
    fn filter_window(self, column: &str, window: &TimeWindow) -> LazyFrame {
        let start = window.start.naive_utc();
        let end = window.end.naive_utc();
        self.filter(
            col(column)
                .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
                .gt(lit(start))
                .and(
                    col(column)
                        .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
                        .lt_eq(lit(end)),
                ),
        )
    }

    fn within_bounds(self, columns: &[&str], lower: f64, upper: f64) -> LazyFrame {
        let Some(predicate) = columns
            .iter()
            .map(|c| col(*c).gt(lit(lower)).and(col(*c).lt(lit(upper))))
            .reduce(|acc, e| acc.and(e))
        else {
            return self;
        };
        self.filter(predicate)
    }

    fn round_columns(self, columns: &[&str], decimals: u32) -> LazyFrame {
        let rounded: Vec<_> = columns.iter().map(|c| col(*c).round(decimals)).collect();
        self.with_columns(rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use polars::prelude::IntoLazy;

    fn readings() -> Vec<Observation> {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        (0..6)
            .map(|i| {
                Observation::new()
                    .with("t", now - TimeDelta::hours(i))
                    .with("temp_f", 70.0 + i as f64)
                    .with("station_id", "KTX")
            })
            .collect()
    }

    #[test]
    fn test_records_to_frame_shapes_and_nulls() -> PolarsResult<()> {
        let mut records = readings();
        records.push(Observation::new().with("temp_f", "broken"));
        let df = records_to_frame(
            &records,
            &[
                ("t", ColumnKind::Timestamp),
                ("temp_f", ColumnKind::Number),
                ("station_id", ColumnKind::Text),
            ],
        )?;
        assert_eq!(df.shape(), (7, 3));
        assert_eq!(df.column("temp_f")?.null_count(), 1);
        assert_eq!(df.column("t")?.null_count(), 1);
        assert!(matches!(
            df.column("t")?.dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, _)
        ));
        Ok(())
    }

    #[test]
    fn test_filter_window_is_open_at_start() -> PolarsResult<()> {
        let records = readings();
        let now: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let window = TimeWindow::resolve("h3", now).expect("valid token");
        let columns = [("t", ColumnKind::Timestamp), ("temp_f", ColumnKind::Number)];
        let df = records_to_frame(&records, &columns)?
            .lazy()
            .filter_window("t", &window)
            .collect()?;
        // 12:00, 11:00 and 10:00; 09:00 is exactly the start and excluded.
        assert_eq!(df.height(), 3);
        Ok(())
    }

    #[test]
    fn test_within_bounds_and_round() -> PolarsResult<()> {
        let records = vec![
            Observation::new().with("a", 1.26).with("b", 2.0),
            Observation::new().with("a", -9999.0).with("b", 2.0),
            Observation::new().with("a", 3.0),
        ];
        let columns = [("a", ColumnKind::Number), ("b", ColumnKind::Number)];
        let df = records_to_frame(&records, &columns)?
            .lazy()
            .within_bounds(&["a", "b"], -9999.0, 9999.0)
            .round_columns(&["a"], 1)
            .collect()?;
        assert_eq!(df.height(), 1);
        let a: Vec<Option<f64>> = df.column("a")?.f64()?.into_iter().collect();
        assert_eq!(a, vec![Some(1.3)]);
        Ok(())
    }
}
