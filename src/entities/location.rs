use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A pickup or drop point: a human-readable address plus its coordinates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stop {
    pub address: String,
    pub coordinates: Coordinates,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in kilometers.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lng1 = self.longitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let lng2 = other.longitude.to_radians();

        let angle = lat1.cos() * lat2.cos() * (lng2 - lng1).cos() + lat1.sin() * lat2.sin();

        // rounding can push the angle just past ±1 for (near-)identical points
        EARTH_RADIUS_KM * angle.clamp(-1.0, 1.0).acos()
    }
}
