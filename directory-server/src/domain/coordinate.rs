//! Geographic coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in statute miles.
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Error returned when a latitude/longitude pair is not a usable position.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinate ({lat}, {lon}): {reason}")]
pub struct InvalidCoordinate {
    lat: f64,
    lon: f64,
    reason: &'static str,
}

/// A validated WGS84 position.
///
/// Latitude is in `[-90, 90]`, longitude in `[-180, 180]`, and both are
/// finite. Any `Coordinate` can be fed to [`Coordinate::distance_miles`]
/// without producing NaN.
///
/// # Examples
///
/// ```
/// use directory_server::domain::Coordinate;
///
/// let troy = Coordinate::new(42.7284, -73.6918).unwrap();
/// assert!(troy.distance_miles(&troy) < 1e-9);
///
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// assert!(Coordinate::new(f64::NAN, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidCoordinate> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(InvalidCoordinate {
                lat,
                lon,
                reason: "must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidCoordinate {
                lat,
                lon,
                reason: "latitude must be within [-90, 90]",
            });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidCoordinate {
                lat,
                lon,
                reason: "longitude must be within [-180, 180]",
            });
        }
        Ok(Coordinate { lat, lon })
    }

    /// Build a coordinate from nullable columns.
    ///
    /// Returns `None` unless both parts are present and valid.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        Coordinate::new(lat?, lon?).ok()
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Haversine great-circle distance to `other`, in miles.
    pub fn distance_miles(&self, other: &Coordinate) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_MILES * c
    }
}

/// Round a distance to two decimal places for display.
pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Degrees of latitude spanned by `miles` along a meridian.
///
/// Handy for placing test fixtures a known distance apart.
pub fn miles_to_lat_degrees(miles: f64) -> f64 {
    (miles / EARTH_RADIUS_MILES).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range() {
        assert!(Coordinate::new(90.5, 0.0).is_err());
        assert!(Coordinate::new(-90.5, 0.0).is_err());
        assert!(Coordinate::new(0.0, 180.5).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
    }

    #[test]
    fn rejects_non_finite() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn accepts_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn from_parts_requires_both() {
        assert!(Coordinate::from_parts(Some(42.0), None).is_none());
        assert!(Coordinate::from_parts(None, Some(-73.0)).is_none());
        assert!(Coordinate::from_parts(Some(142.0), Some(-73.0)).is_none());
        assert!(Coordinate::from_parts(Some(42.0), Some(-73.0)).is_some());
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = Coordinate::new(0.0, 0.0).unwrap();
        let b = Coordinate::new(1.0, 0.0).unwrap();
        let d = a.distance_miles(&b);
        assert!((d - 69.09).abs() < 0.05, "got {d}");
    }

    #[test]
    fn known_city_pair() {
        // Albany to Troy is roughly 7 miles
        let albany = Coordinate::new(42.6526, -73.7562).unwrap();
        let troy = Coordinate::new(42.7284, -73.6918).unwrap();
        let d = albany.distance_miles(&troy);
        assert!((6.0..7.5).contains(&d), "got {d}");
    }

    #[test]
    fn miles_to_degrees_inverts_distance() {
        let a = Coordinate::new(42.0, -73.0).unwrap();
        let b = Coordinate::new(42.0 + miles_to_lat_degrees(0.3), -73.0).unwrap();
        assert!((a.distance_miles(&b) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_hundredths(0.104), 0.1);
        assert_eq!(round_hundredths(0.105_1), 0.11);
        assert_eq!(round_hundredths(1.0), 1.0);
    }
}
