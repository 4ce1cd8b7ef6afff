//! Stops, stations and geographic positions.

use serde::{Deserialize, Serialize};

use super::StopId;

/// Mean Earth radius used for great-circle distances.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Haversine distance in metres.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

/// A stop or station.
///
/// Platforms usually carry a `parent_station_id`; the parent lists its
/// platforms in `child_stop_ids`. Grouping happens at the parent level while
/// feed data is matched against the individual platform ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub parent_station_id: Option<StopId>,
    #[serde(default)]
    pub child_stop_ids: Vec<StopId>,
}

impl Stop {
    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_to_self() {
        let p = Position::new(42.3555, -71.0605);
        assert_eq!(p.distance_to(&p), 0.0);
    }

    #[test]
    fn known_distance() {
        // Park Street to Downtown Crossing, roughly 200m apart
        let park = Position::new(42.35639, -71.0624);
        let dtx = Position::new(42.35550, -71.0603);
        let d = park.distance_to(&dtx);

        assert!(d > 150.0 && d < 250.0, "unexpected distance {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Position::new(42.0, -71.0);
        let b = Position::new(42.5, -70.5);
        let diff = (a.distance_to(&b) - b.distance_to(&a)).abs();

        assert!(diff < 1e-6);
    }

    #[test]
    fn deserialize_platform() {
        let json = r#"{
            "id": "70075",
            "name": "Park Street",
            "latitude": 42.35639,
            "longitude": -71.0624,
            "parent_station_id": "place-pktrm"
        }"#;
        let stop: Stop = serde_json::from_str(json).unwrap();

        assert_eq!(stop.parent_station_id, Some(StopId::new("place-pktrm")));
        assert!(stop.child_stop_ids.is_empty());
    }
}
