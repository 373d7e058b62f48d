//! Geographic coordinates and distances.

/// Mean earth radius in meters, as used by the proximity index.
const EARTH_RADIUS_M: f64 = 6_372_797.560_856;

/// A WGS84 coordinate, longitude then latitude, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

impl Coord {
    pub fn new(lon: f64, lat: f64) -> Self {
        Coord { lon, lat }
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_to(&self, other: &Coord) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let c = Coord::new(2.35, 48.85);
        assert!(c.distance_to(&c) < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111km() {
        let a = Coord::new(0.0, 48.0);
        let b = Coord::new(0.0, 49.0);
        let d = a.distance_to(&b);
        assert!((d - 111_000.0).abs() < 1_000.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coord::new(2.35, 48.85);
        let b = Coord::new(2.36, 48.86);
        assert!((a.distance_to(&b) - b.distance_to(&a)).abs() < 1e-9);
    }
}
