//! Great-circle distance on a spherical Earth.

use crate::coordinate::Coordinate;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates, in kilometres.
///
/// ```
/// use geoalarm::{haversine_km, Coordinate};
///
/// let a = Coordinate::new(0.0, 0.0).unwrap();
/// let b = Coordinate::new(1.0, 0.0).unwrap();
/// assert!((haversine_km(&a, &b) - 111.19).abs() < 0.01);
/// ```
#[must_use]
pub fn haversine_km(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1 = from.latitude().to_radians();
    let lat2 = to.latitude().to_radians();
    let d_lat = (to.latitude() - from.latitude()).to_radians();
    let d_lon = (to.longitude() - from.longitude()).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Haversine distance in metres.
#[must_use]
pub fn haversine_m(from: &Coordinate, to: &Coordinate) -> f64 {
    haversine_km(from, to) * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn coincident_points_are_zero_apart() {
        let p = c(37.7749, -122.4194);
        assert_eq!(haversine_km(&p, &p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let berlin = c(52.5200, 13.4050);
        let paris = c(48.8566, 2.3522);
        assert_eq!(haversine_km(&berlin, &paris), haversine_km(&paris, &berlin));
    }

    #[test]
    fn one_degree_of_latitude_at_equator() {
        let d = haversine_km(&c(0.0, 0.0), &c(1.0, 0.0));
        assert!((d - 111.2).abs() <= 111.2 * 0.01, "got {d}");
    }

    #[test]
    fn berlin_to_paris() {
        let d = haversine_km(&c(52.5200, 13.4050), &c(48.8566, 2.3522));
        assert!((d - 878.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn antipodes_are_half_circumference() {
        let d = haversine_km(&c(0.0, 0.0), &c(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn crosses_antimeridian_the_short_way() {
        let d = haversine_km(&c(0.0, 179.9), &c(0.0, -179.9));
        assert!(d < 25.0, "got {d}");
    }

    #[test]
    fn metres_scale_kilometres() {
        let a = c(10.0, 10.0);
        let b = c(10.001, 10.0);
        assert!((haversine_m(&a, &b) - haversine_km(&a, &b) * 1000.0).abs() < 1e-9);
    }
}
