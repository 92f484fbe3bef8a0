//! Wind rose: frequency of wind speed categories per compass sector.

use crate::reshape::grouping::compass_sector;
use crate::types::observation::Observation;
use crate::types::series::{BucketKey, Series};
use crate::types::units::round_to;

/// Speed categories in mph, upper bound inclusive. `calm` is exactly zero.
pub const WIND_SPEED_CATEGORIES: [&str; 6] = ["calm", "0-1", "1-2", "2-5", "5-10", ">10"];
const CATEGORY_UPPER_BOUNDS: [f64; 5] = [0.0, 1.0, 2.0, 5.0, 10.0];

pub const WIND_SECTOR_DEGREES: f64 = 15.0;
const SECTOR_COUNT: usize = 24;

/// Index into [`WIND_SPEED_CATEGORIES`], `None` for negative or non-finite speeds.
pub fn speed_category(mph: f64) -> Option<usize> {
    if !mph.is_finite() || mph < 0.0 {
        return None;
    }
    Some(
        CATEGORY_UPPER_BOUNDS
            .iter()
            .position(|upper| mph <= *upper)
            .unwrap_or(WIND_SPEED_CATEGORIES.len() - 1),
    )
}

/// Builds one series per speed category, each with a point per 15° sector (theta
/// label `"0"` to `"345"`).
///
/// Readings with a missing or negative direction fall in sector 0. Readings
/// without a usable speed are skipped. The calm column is spread evenly over all
/// sectors (its mean). Columns are then stacked in category order, so each series
/// holds the share of readings at or below its category, and expressed as a
/// percentage of the categorized readings rounded to two decimals. No readings
/// means no series.
pub fn wind_rose(records: &[Observation], direction_key: &str, speed_key: &str) -> Vec<Series> {
    let mut counts = [[0.0f64; WIND_SPEED_CATEGORIES.len()]; SECTOR_COUNT];
    let mut total = 0usize;

    for record in records {
        let Some(category) = record.number(speed_key).and_then(speed_category) else {
            continue;
        };
        let direction = record
            .number(direction_key)
            .filter(|d| *d >= 0.0)
            .unwrap_or(0.0);
        let sector =
            (compass_sector(direction, WIND_SECTOR_DEGREES) / WIND_SECTOR_DEGREES) as usize;
        counts[sector.min(SECTOR_COUNT - 1)][category] += 1.0;
        total += 1;
    }
    if total == 0 {
        return Vec::new();
    }

    let calm_mean = counts.iter().map(|row| row[0]).sum::<f64>() / SECTOR_COUNT as f64;
    for row in counts.iter_mut() {
        row[0] = calm_mean;
        for c in 1..row.len() {
            row[c] += row[c - 1];
        }
    }

    WIND_SPEED_CATEGORIES
        .iter()
        .enumerate()
        .map(|(c, name)| {
            let points = counts
                .iter()
                .enumerate()
                .map(|(s, row)| {
                    let theta = BucketKey::label(format!("{}", s * WIND_SECTOR_DEGREES as usize));
                    (theta, round_to(row[c] / total as f64 * 100.0, 2))
                })
                .collect();
            Series::from_points(*name, points)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wind(dir: Option<f64>, mph: f64) -> Observation {
        let obs = Observation::new().with("wind_mph", mph);
        match dir {
            Some(d) => obs.with("wind_degrees", d),
            None => obs,
        }
    }

    #[test]
    fn test_speed_categories_are_upper_inclusive() {
        let cases = [
            (0.0, 0),
            (0.1, 1),
            (1.0, 1),
            (1.5, 2),
            (2.0, 2),
            (5.0, 3),
            (10.0, 4),
            (10.1, 5),
        ];
        for (mph, idx) in cases {
            assert_eq!(speed_category(mph), Some(idx), "{mph} mph");
        }
        assert_eq!(speed_category(-1.0), None);
    }

    #[test]
    fn test_wind_rose_stacks_and_normalizes() {
        let records = vec![
            wind(Some(90.0), 0.0),
            wind(Some(10.0), 0.5),
            wind(Some(359.0), 3.0),
            wind(Some(360.0), 12.0),
            Observation::new().with("wind_degrees", 180.0),
        ];
        let rose = wind_rose(&records, "wind_degrees", "wind_mph");
        assert_eq!(rose.len(), 6);
        assert_eq!(rose[0].name, "calm");
        assert!(rose.iter().all(|s| s.len() == 24));

        let at = |series: &Series, theta: &str| series.get(&BucketKey::label(theta)).unwrap();

        // Calm is spread evenly: 1 reading / 24 sectors / 4 readings.
        assert!(rose[0].ys().iter().all(|y| *y == 1.04));
        // 0.5 mph at 10° and 12 mph at 360° both land in sector 0.
        assert_eq!(at(&rose[1], "0"), 26.04);
        assert_eq!(at(&rose[5], "0"), 51.04);
        // 359° lands in sector 345 in the 2-5 column.
        assert_eq!(at(&rose[3], "345"), 26.04);
        assert_eq!(at(&rose[2], "345"), 1.04);
        // Stacking never decreases across categories.
        for s in 0..24 {
            let column: Vec<f64> = rose.iter().map(|series| series.points[s].1).collect();
            assert!(column.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_missing_direction_goes_to_north() {
        let rose = wind_rose(&[wind(None, 4.0)], "wind_degrees", "wind_mph");
        assert_eq!(rose[3].get(&BucketKey::label("0")), Some(100.0));
        assert_eq!(rose[3].get(&BucketKey::label("15")), Some(0.0));
    }

    #[test]
    fn test_no_readings() {
        assert!(wind_rose(&[], "wind_degrees", "wind_mph").is_empty());
    }
}
