//! Great-circle distances and circular geofences over observations carrying a
//! latitude and a longitude. Includes the `rstar` implementations used to prefilter
//! candidates by bounding box before the exact distance test.

use crate::types::observation::Observation;
use ordered_float::OrderedFloat;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MI: f64 = 3959.0;

/// Represents a geographical coordinate using latitude and longitude, in degrees.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use dashframe::LatLon;
///
/// let houston = LatLon(29.780880, -95.420410);
/// assert_eq!(houston.0, 29.780880); // Latitude
/// assert_eq!(houston.1, -95.420410); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn lat(&self) -> f64 {
        self.0
    }

    pub fn lon(&self) -> f64 {
        self.1
    }

    /// Reads a coordinate out of an observation. Both fields must be numeric.
    pub fn from_observation(obs: &Observation, lat_key: &str, lon_key: &str) -> Option<Self> {
        Some(LatLon(obs.number(lat_key)?, obs.number(lon_key)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Kilometers,
    Miles,
}

impl DistanceUnit {
    pub fn earth_radius(&self) -> f64 {
        match self {
            DistanceUnit::Kilometers => EARTH_RADIUS_KM,
            DistanceUnit::Miles => EARTH_RADIUS_MI,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
        }
    }
}

/// Great-circle distance by the spherical law of cosines:
/// `R * acos(sin φ1 sin φ2 + cos φ1 cos φ2 cos Δλ)`.
///
/// The `acos` argument is clamped to `[-1, 1]`, identical coordinates return
/// exactly `0.0`, and `Δλ` is taken as an absolute value so the result is
/// bit-for-bit symmetric in its arguments.
///
/// # Examples
///
/// ```
/// use dashframe::{great_circle_distance, DistanceUnit, LatLon};
///
/// let pole = LatLon(90.0, 180.0);
/// assert_eq!(great_circle_distance(pole, pole, DistanceUnit::Kilometers), 0.0);
///
/// let a = LatLon(29.78, -95.42);
/// let b = LatLon(30.27, -97.74);
/// let d = great_circle_distance(a, b, DistanceUnit::Miles);
/// assert!((d - 143.0).abs() < 2.0);
/// ```
pub fn great_circle_distance(a: LatLon, b: LatLon, unit: DistanceUnit) -> f64 {
    if a == b {
        return 0.0;
    }
    let (phi1, phi2) = (a.0.to_radians(), b.0.to_radians());
    let delta_lambda = (b.1 - a.1).abs().to_radians();
    let cos_angle =
        phi1.sin() * phi2.sin() + phi1.cos() * phi2.cos() * delta_lambda.cos();
    unit.earth_radius() * cos_angle.clamp(-1.0, 1.0).acos()
}

/// A circular inclusion filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub center: LatLon,
    pub radius: f64,
    #[serde(default)]
    pub unit: DistanceUnit,
}

/// Point stored in the prefilter tree; `index` points back into the record slice.
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    location: LatLon,
    index: usize,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.0, self.location.1])
    }
}

/// Widens the bounding box a hair so boundary points are never lost to rounding.
const BOX_MARGIN_DEG: f64 = 1e-9;

impl Geofence {
    pub fn new(center: LatLon, radius: f64, unit: DistanceUnit) -> Self {
        Self {
            center,
            radius,
            unit,
        }
    }

    pub fn km(center: LatLon, radius_km: f64) -> Self {
        Self::new(center, radius_km, DistanceUnit::Kilometers)
    }

    pub fn distance_to(&self, point: LatLon) -> f64 {
        great_circle_distance(self.center, point, self.unit)
    }

    pub fn contains(&self, point: LatLon) -> bool {
        self.distance_to(point) <= self.radius
    }

    /// Degree-space box enclosing the circle, `None` when the circle reaches a pole
    /// or wraps across the antimeridian and a box would not be conservative.
    fn bounding_box(&self) -> Option<AABB<[f64; 2]>> {
        let angular = self.radius / self.unit.earth_radius();
        if !angular.is_finite() || angular < 0.0 || angular >= std::f64::consts::PI {
            return None;
        }
        let LatLon(lat, lon) = self.center;
        let angular_deg = angular.to_degrees();
        let (min_lat, max_lat) = (lat - angular_deg, lat + angular_deg);
        if min_lat <= -90.0 || max_lat >= 90.0 {
            return None;
        }
        let ratio = angular.sin() / lat.to_radians().cos();
        if !(0.0..1.0).contains(&ratio) {
            return None;
        }
        let half_width = ratio.asin().to_degrees();
        let (min_lon, max_lon) = (lon - half_width, lon + half_width);
        if min_lon <= -180.0 || max_lon >= 180.0 {
            return None;
        }
        Some(AABB::from_corners(
            [min_lat - BOX_MARGIN_DEG, min_lon - BOX_MARGIN_DEG],
            [max_lat + BOX_MARGIN_DEG, max_lon + BOX_MARGIN_DEG],
        ))
    }

    /// Keeps the records inside the fence, paired with their distance from the
    /// center and sorted closest first. Records without a usable coordinate are
    /// skipped.
    pub fn select<'a>(
        &self,
        records: &'a [Observation],
        lat_key: &str,
        lon_key: &str,
    ) -> Vec<(f64, &'a Observation)> {
        let points: Vec<IndexedPoint> = records
            .iter()
            .enumerate()
            .filter_map(|(index, obs)| {
                LatLon::from_observation(obs, lat_key, lon_key)
                    .map(|location| IndexedPoint { location, index })
            })
            .collect();

        let candidates: Vec<IndexedPoint> = match self.bounding_box() {
            Some(envelope) => {
                let tree = RTree::bulk_load(points);
                tree.locate_in_envelope(&envelope).copied().collect()
            }
            None => points,
        };

        let mut selected: Vec<(f64, &'a Observation)> = candidates
            .into_iter()
            .filter_map(|point| {
                let distance = self.distance_to(point.location);
                (distance <= self.radius).then(|| (distance, &records[point.index]))
            })
            .collect();
        selected.sort_by_key(|(distance, _)| OrderedFloat(*distance));
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_obs(lat: f64, lon: f64) -> Observation {
        Observation::new().with("latitude", lat).with("longitude", lon)
    }

    #[test]
    fn test_distance_to_self_is_exactly_zero() {
        let points = [
            LatLon(0.0, 0.0),
            LatLon(90.0, 0.0),
            LatLon(-90.0, 45.0),
            LatLon(0.0, 180.0),
            LatLon(0.0, -180.0),
            LatLon(12.345678, -98.7654321),
            LatLon(-33.8688, 151.2093),
        ];
        for p in points {
            for unit in [DistanceUnit::Kilometers, DistanceUnit::Miles] {
                let d = great_circle_distance(p, p, unit);
                assert_eq!(d, 0.0, "distance from {p:?} to itself was {d}");
                assert!(!d.is_nan());
            }
        }
    }

    #[test]
    fn test_nearly_identical_points_do_not_produce_nan() {
        let a = LatLon(45.0, 7.0);
        let b = LatLon(45.0, 7.0 + 1e-12);
        let d = great_circle_distance(a, b, DistanceUnit::Kilometers);
        assert!(d.is_finite());
        assert!(d < 1e-3);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            (LatLon(29.78088, -95.42041), LatLon(35.4, -119.0)),
            (LatLon(90.0, 0.0), LatLon(-90.0, 0.0)),
            (LatLon(0.0, 179.9), LatLon(0.0, -179.9)),
            (LatLon(-12.5, 33.3), LatLon(48.85, 2.35)),
        ];
        for (a, b) in pairs {
            let unit = DistanceUnit::Kilometers;
            assert_eq!(great_circle_distance(a, b, unit), great_circle_distance(b, a, unit));
        }
    }

    #[test]
    fn test_antipodes_and_quarter_circumference() {
        let half = great_circle_distance(
            LatLon(90.0, 0.0),
            LatLon(-90.0, 0.0),
            DistanceUnit::Kilometers,
        );
        assert!((half - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);

        let quarter = great_circle_distance(
            LatLon(0.0, 0.0),
            LatLon(0.0, 90.0),
            DistanceUnit::Miles,
        );
        assert!((quarter - std::f64::consts::FRAC_PI_2 * EARTH_RADIUS_MI).abs() < 1e-6);
    }

    #[test]
    fn test_matches_haversine_crate() {
        let pairs = [
            (LatLon(29.78088, -95.42041), LatLon(30.2672, -97.7431)),
            (LatLon(52.52, 13.40), LatLon(48.85, 2.35)),
            (LatLon(-33.86, 151.21), LatLon(-37.81, 144.96)),
        ];
        for (a, b) in pairs {
            let ours = great_circle_distance(a, b, DistanceUnit::Kilometers);
            let reference = haversine::distance(
                haversine::Location {
                    latitude: a.0,
                    longitude: a.1,
                },
                haversine::Location {
                    latitude: b.0,
                    longitude: b.1,
                },
                haversine::Units::Kilometers,
            );
            assert!(
                (ours - reference).abs() < 0.5,
                "law of cosines {ours} vs haversine {reference}"
            );
        }
    }

    #[test]
    fn test_zero_radius_keeps_only_the_center() {
        let records = vec![
            point_obs(29.78088, -95.42041),
            point_obs(29.78089, -95.42041),
            point_obs(30.0, -95.0),
        ];
        let fence = Geofence::km(LatLon(29.78088, -95.42041), 0.0);
        let selected = fence.select(&records, "latitude", "longitude");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].0, 0.0);
        assert!(std::ptr::eq(selected[0].1, &records[0]));
    }

    #[test]
    fn test_select_sorts_by_distance_and_skips_incomplete_records() {
        let center = LatLon(29.78088, -95.42041);
        let records = vec![
            point_obs(30.5, -95.42041),  // ~80 km north
            point_obs(29.8, -95.42041),  // ~2 km north
            Observation::new().with("latitude", 29.79), // no longitude
            point_obs(32.0, -95.42041),  // ~247 km
            point_obs(33.0, -95.42041),  // ~358 km, outside
        ];
        let fence = Geofence::km(center, 250.0);
        let selected = fence.select(&records, "latitude", "longitude");
        let lats: Vec<f64> = selected
            .iter()
            .map(|(_, obs)| obs.number("latitude").unwrap())
            .collect();
        assert_eq!(lats, vec![29.8, 30.5, 32.0]);
        assert!(selected.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn test_prefilter_agrees_with_full_scan() {
        let center = LatLon(35.4, -119.0);
        let fence = Geofence::km(center, 40.0);
        let mut records = Vec::new();
        for i in 0..40 {
            for j in 0..40 {
                records.push(point_obs(34.9 + i as f64 * 0.025, -119.6 + j as f64 * 0.03));
            }
        }
        let selected = fence.select(&records, "latitude", "longitude").len();
        let brute = records
            .iter()
            .filter(|obs| {
                fence.contains(LatLon::from_observation(obs, "latitude", "longitude").unwrap())
            })
            .count();
        assert!(selected > 0);
        assert_eq!(selected, brute);
    }

    #[test]
    fn test_fence_across_antimeridian_falls_back_to_scan() {
        let fence = Geofence::km(LatLon(0.0, 179.95), 50.0);
        let records = vec![point_obs(0.0, -179.95), point_obs(0.0, 170.0)];
        let selected = fence.select(&records, "latitude", "longitude");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].1.number("longitude"), Some(-179.95));
    }

    #[test]
    fn test_zero_radius_on_the_antimeridian_keeps_both_signs() {
        let fence = Geofence::km(LatLon(0.0, 180.0), 0.0);
        let records = vec![point_obs(0.0, -180.0), point_obs(0.0, 179.9)];
        let selected = fence.select(&records, "latitude", "longitude");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].0, 0.0);
        assert_eq!(selected[0].1.number("longitude"), Some(-180.0));
    }

    #[test]
    fn test_fence_around_the_pole() {
        let fence = Geofence::km(LatLon(90.0, 0.0), 100.0);
        let records = vec![
            point_obs(89.5, 120.0),  // ~56 km
            point_obs(89.5, -60.0),  // ~56 km
            point_obs(90.0, 45.0),   // the pole itself
            point_obs(88.0, 0.0),    // ~222 km, outside
        ];
        let selected = fence.select(&records, "latitude", "longitude");
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0].1.number("latitude"), Some(90.0));
        assert!(selected[0].0 < 1e-6);
    }
}
