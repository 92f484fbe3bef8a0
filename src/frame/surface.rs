use crate::frame::{records_to_frame, ColumnKind, ObservationFrameExt};
use crate::types::observation::Observation;
use ordered_float::OrderedFloat;
use polars::prelude::{col, IntoLazy, PolarsResult};
use std::collections::{BTreeMap, BTreeSet};

/// Values at or beyond this magnitude are sensor sentinels.
pub const SURFACE_SENTINEL: f64 = 9999.0;

/// A rectangular `z = f(x, y)` grid. `z[j][i]` is the value at `(x[i], y[j])`, the
/// row-per-y layout surface plots expect. Cells without data are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<Vec<Option<f64>>>,
}

impl SurfaceGrid {
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn at(&self, x: f64, y: f64) -> Option<f64> {
        let i = self.x.iter().position(|v| *v == x)?;
        let j = self.y.iter().position(|v| *v == y)?;
        self.z[j][i]
    }
}

/// Mean of `z_key` over `(x_key, y_key)` after dropping sentinel rows and rounding
/// all three fields to one decimal.
///
/// # Errors
///
/// Returns a `PolarsError` if the lazy query fails to execute.
pub fn mean_surface(
    records: &[Observation],
    x_key: &str,
    y_key: &str,
    z_key: &str,
) -> PolarsResult<SurfaceGrid> {
    let keys = [x_key, y_key, z_key];
    let df = records_to_frame(
        records,
        &[
            (x_key, ColumnKind::Number),
            (y_key, ColumnKind::Number),
            (z_key, ColumnKind::Number),
        ],
    )?
    .lazy()
    .within_bounds(&keys, -SURFACE_SENTINEL, SURFACE_SENTINEL)
    .round_columns(&keys, 1)
    .group_by([col(x_key), col(y_key)])
    .agg([col(z_key).mean()])
    .collect()?;

    let xs = df.column(x_key)?.f64()?;
    let ys = df.column(y_key)?.f64()?;
    let zs = df.column(z_key)?.f64()?;

    let mut cells: BTreeMap<(OrderedFloat<f64>, OrderedFloat<f64>), f64> = BTreeMap::new();
    let mut x_axis: BTreeSet<OrderedFloat<f64>> = BTreeSet::new();
    let mut y_axis: BTreeSet<OrderedFloat<f64>> = BTreeSet::new();
    for ((x, y), z) in xs.into_iter().zip(ys.into_iter()).zip(zs.into_iter()) {
        if let (Some(x), Some(y), Some(z)) = (x, y, z) {
            let (x, y) = (OrderedFloat(x), OrderedFloat(y));
            x_axis.insert(x);
            y_axis.insert(y);
            cells.insert((x, y), z);
        }
    }

    let z = y_axis
        .iter()
        .map(|y| x_axis.iter().map(|x| cells.get(&(*x, *y)).copied()).collect())
        .collect();
    Ok(SurfaceGrid {
        x: x_axis.into_iter().map(|v| v.0).collect(),
        y: y_axis.into_iter().map(|v| v.0).collect(),
        z,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(temp: f64, dew: f64, humidity: f64) -> Observation {
        Observation::new()
            .with("temp_f", temp)
            .with("dewpoint_f", dew)
            .with("relative_humidity", humidity)
    }

    #[test]
    fn test_mean_surface_grid() -> PolarsResult<()> {
        let records = vec![
            reading(70.04, 60.0, 50.0),
            reading(70.0, 60.01, 70.0),
            reading(71.0, 61.0, 80.0),
            reading(-9999.0, 61.0, 80.0),
            reading(71.0, 61.0, 10000.0),
            Observation::new().with("temp_f", 72.0),
        ];
        let grid = mean_surface(&records, "temp_f", "dewpoint_f", "relative_humidity")?;

        assert_eq!(grid.x, vec![70.0, 71.0]);
        assert_eq!(grid.y, vec![60.0, 61.0]);
        assert_eq!(grid.z.len(), 2);
        assert!(grid.z.iter().all(|row| row.len() == 2));
        assert_eq!(grid.at(70.0, 60.0), Some(60.0));
        assert_eq!(grid.at(71.0, 61.0), Some(80.0));
        assert_eq!(grid.at(71.0, 60.0), None);
        assert_eq!(grid.at(70.0, 61.0), None);
        Ok(())
    }

    #[test]
    fn test_mean_surface_without_rows() -> PolarsResult<()> {
        let grid = mean_surface(&[], "a", "b", "c")?;
        assert!(grid.is_empty());
        assert!(grid.z.is_empty());
        Ok(())
    }
}
