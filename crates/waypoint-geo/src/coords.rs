//! Coordinates
//!
//! The single internal coordinate order is `[longitude, latitude]`.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (IUGG)
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 point, longitude first.
///
/// External shapes (history records with separate latitude/longitude
/// fields, geocoder features, device fixes, provider geometry) are
/// converted into this type where they enter the system. Serialized as
/// a `[lng, lat]` array, which is also the GeoJSON order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Build from a latitude-first source.
    pub const fn from_lat_lng(lat: f64, lng: f64) -> Self {
        Self { lng, lat }
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    /// Finite and within the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lng)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_to(&self, other: &LngLat) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        p.to_array()
    }
}

impl std::fmt::Display for LngLat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lng, self.lat)
    }
}
