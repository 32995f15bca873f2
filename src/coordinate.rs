//! Geographic coordinates.
//!
//! A `Coordinate` is an immutable latitude/longitude pair in degrees. It is the
//! only geometric value the alarm works with: live positions, map taps and
//! typed-in targets all end up as one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Latitude bounds in degrees.
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

/// Longitude bounds in degrees.
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// A point on the globe in decimal degrees.
///
/// # Examples
///
/// ```
/// use geoalarm::Coordinate;
///
/// let target: Coordinate = "37.7749, -122.4194".parse().unwrap();
/// assert_eq!(target.latitude(), 37.7749);
/// assert_eq!(target.longitude(), -122.4194);
/// assert_eq!(target.to_string(), "37.7749, -122.4194");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate", into = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Creates a validated coordinate.
    ///
    /// Both components must be finite and inside their ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate { field: "latitude" });
        }
        if !longitude.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate { field: "longitude" });
        }
        if latitude < LATITUDE_RANGE.0 || latitude > LATITUDE_RANGE.1 {
            return Err(ValidationError::LatitudeOutOfRange { value: latitude });
        }
        if longitude < LONGITUDE_RANGE.0 || longitude > LONGITUDE_RANGE.1 {
            return Err(ValidationError::LongitudeOutOfRange { value: longitude });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        crate::distance::haversine_km(self, other)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinate {
    type Err = ValidationError;

    /// Parses `"<lat>, <lon>"`.
    ///
    /// Exactly two comma-separated numbers are accepted; surrounding whitespace
    /// is ignored.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| ValidationError::MalformedCoordinate {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = input.split(',');
        let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed("expected 'latitude, longitude'"));
        };

        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| malformed("latitude is not a number"))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|_| malformed("longitude is not a number"))?;

        Self::new(lat, lon)
    }
}

/// Unvalidated wire form, so deserialization goes through `Coordinate::new`.
#[derive(Serialize, Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = ValidationError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl From<Coordinate> for RawCoordinate {
    fn from(c: Coordinate) -> Self {
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_input_exactly() {
        let c: Coordinate = "37.7749, -122.4194".parse().unwrap();
        assert_eq!(c.latitude(), 37.7749);
        assert_eq!(c.longitude(), -122.4194);
    }

    #[test]
    fn parses_without_spaces_and_with_padding() {
        let c: Coordinate = "  -33.8688,151.2093 ".parse().unwrap();
        assert_eq!(c, Coordinate::new(-33.8688, 151.2093).unwrap());
    }

    #[test]
    fn rejects_non_numeric_latitude() {
        let err = "abc, 12".parse::<Coordinate>().unwrap_err();
        assert!(matches!(err, ValidationError::MalformedCoordinate { .. }));
    }

    #[test]
    fn rejects_wrong_arity() {
        for input in ["", "37.0", "37.0, -122.0, 5", "37.0 -122.0"] {
            let err = input.parse::<Coordinate>().unwrap_err();
            assert!(
                matches!(err, ValidationError::MalformedCoordinate { .. }),
                "{input:?} should be malformed, got {err:?}"
            );
        }
    }

    #[test]
    fn rejects_non_finite_and_out_of_range() {
        assert_eq!(
            "NaN, 0".parse::<Coordinate>().unwrap_err(),
            ValidationError::NonFiniteCoordinate { field: "latitude" }
        );
        assert_eq!(
            "0, inf".parse::<Coordinate>().unwrap_err(),
            ValidationError::NonFiniteCoordinate { field: "longitude" }
        );
        assert_eq!(
            Coordinate::new(90.5, 0.0).unwrap_err(),
            ValidationError::LatitudeOutOfRange { value: 90.5 }
        );
        assert_eq!(
            Coordinate::new(0.0, -180.25).unwrap_err(),
            ValidationError::LongitudeOutOfRange { value: -180.25 }
        );
    }

    #[test]
    fn accepts_range_edges() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn display_matches_text_input_form() {
        let c = Coordinate::new(51.5007, -0.1246).unwrap();
        assert_eq!(c.to_string(), "51.5007, -0.1246");
        assert_eq!(c.to_string().parse::<Coordinate>().unwrap(), c);
    }

    #[test]
    fn distance_km_delegates_to_haversine() {
        let a = Coordinate::new(0.0, 0.0).unwrap();
        let b = Coordinate::new(0.0, 1.0).unwrap();
        assert_eq!(a.distance_km(&b), crate::distance::haversine_km(&a, &b));
    }

    #[test]
    fn deserialization_validates() {
        let ok: Coordinate = serde_json::from_str(r#"{"latitude":1.5,"longitude":2.5}"#).unwrap();
        assert_eq!(ok, Coordinate::new(1.5, 2.5).unwrap());

        let bad = serde_json::from_str::<Coordinate>(r#"{"latitude":120.0,"longitude":0.0}"#);
        assert!(bad.is_err());
    }
}
