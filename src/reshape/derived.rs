//! Fields computed from other fields of the same record.

use crate::types::observation::Observation;

/// Estimated cloud base in feet above ground from temperature and dew point in
/// Fahrenheit: the spread shrinks by about 4.4 °F per 1000 ft of lift.
///
/// # Examples
///
/// ```
/// use dashframe::cloud_base_ft;
///
/// assert!((cloud_base_ft(75.0, 66.2) - 2050.0).abs() < 1e-6);
/// ```
pub fn cloud_base_ft(temp_f: f64, dewpoint_f: f64) -> f64 {
    ((temp_f - dewpoint_f) / 4.4) * 1000.0 + 50.0
}

/// Returns copies of `records` with `out_key` set to `derive(record)`. Records
/// where `derive` yields `None` are kept unchanged.
pub fn with_derived_field<F>(records: &[Observation], out_key: &str, derive: F) -> Vec<Observation>
where
    F: Fn(&Observation) -> Option<f64>,
{
    records
        .iter()
        .map(|record| {
            let mut record = record.clone();
            if let Some(value) = derive(&record) {
                record.insert(out_key, value);
            }
            record
        })
        .collect()
}

/// Adds `cloudbase` computed from `temp_f` and `dewpoint_f`. Readings below
/// `floor` on either input are sensor faults and produce no cloud base.
pub fn with_cloud_base(records: &[Observation], floor: f64) -> Vec<Observation> {
    with_derived_field(records, "cloudbase", |r| {
        let temp = r.number("temp_f").filter(|v| *v >= floor)?;
        let dew = r.number("dewpoint_f").filter(|v| *v >= floor)?;
        Some(cloud_base_ft(temp, dew))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_base_saturated_air() {
        assert_eq!(cloud_base_ft(60.0, 60.0), 50.0);
    }

    #[test]
    fn test_with_cloud_base_skips_faults() {
        let records = vec![
            Observation::new().with("temp_f", 80.0).with("dewpoint_f", 71.2),
            Observation::new().with("temp_f", 80.0).with("dewpoint_f", -9999.0),
            Observation::new().with("temp_f", 80.0),
        ];
        let derived = with_cloud_base(&records, -50.0);
        assert_eq!(derived.len(), 3);
        assert!((derived[0].number("cloudbase").unwrap() - 2050.0).abs() < 1e-9);
        assert_eq!(derived[1].number("cloudbase"), None);
        assert_eq!(derived[2].number("cloudbase"), None);
        // Inputs untouched.
        assert!(!records[0].has("cloudbase"));
    }
}
