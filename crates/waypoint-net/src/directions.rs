//! Directions Provider
//!
//! Driving routes from a Mapbox-compatible directions API.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use url::Url;
use waypoint_geo::LngLat;

use crate::{NetError, Request, ResourceLoader, Transport};

/// Public Mapbox API host
pub const DEFAULT_DIRECTIONS_URL: &str = "https://api.mapbox.com";

/// Only driving is supported
const DRIVING_PROFILE: &str = "mapbox/driving";

/// Best route between two points.
///
/// Every field absent means the provider found no route, which is a normal
/// outcome and not an error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteResult {
    /// Path to draw, `[lng, lat]` pairs in travel order
    pub geometry: Option<Vec<LngLat>>,
    pub duration_seconds: Option<f64>,
    pub distance_meters: Option<f64>,
}

impl RouteResult {
    pub fn no_route() -> Self {
        Self::default()
    }

    pub fn is_no_route(&self) -> bool {
        self.geometry.is_none() && self.duration_seconds.is_none() && self.distance_meters.is_none()
    }
}

/// Directions error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DirectionsError {
    #[error("Route unavailable: provider returned HTTP {0}")]
    Status(u16),

    #[error("Route unavailable: {0}")]
    Net(#[from] NetError),

    #[error("Route unavailable: no answer within {0:?}")]
    Timeout(Duration),
}

/// Source of driving routes
pub trait DirectionsProvider {
    fn fetch_route(
        &self,
        start: LngLat,
        end: LngLat,
    ) -> impl Future<Output = Result<RouteResult, DirectionsError>>;
}

#[derive(Deserialize)]
struct DirectionsBody {
    routes: Option<Vec<RouteBody>>,
}

#[derive(Deserialize)]
struct RouteBody {
    geometry: Option<LineString>,
    duration: Option<f64>,
    distance: Option<f64>,
}

#[derive(Deserialize)]
struct LineString {
    coordinates: Vec<LngLat>,
}

/// Parse a directions response body, keeping only the first (best) route.
pub fn parse_directions(body: &[u8]) -> Result<RouteResult, DirectionsError> {
    let parsed: DirectionsBody =
        serde_json::from_slice(body).map_err(|e| NetError::Decode(e.to_string()))?;

    let Some(best) = parsed.routes.and_then(|routes| routes.into_iter().next()) else {
        return Ok(RouteResult::no_route());
    };

    Ok(RouteResult {
        geometry: best.geometry.map(|g| g.coordinates),
        duration_seconds: best.duration,
        distance_meters: best.distance,
    })
}

/// Directions API client
#[derive(Debug, Clone)]
pub struct DirectionsClient<T = ResourceLoader> {
    transport: T,
    base: Url,
    access_token: String,
}

impl<T: Transport> DirectionsClient<T> {
    pub fn new(transport: T, base: Url, access_token: impl Into<String>) -> Self {
        Self {
            transport,
            base,
            access_token: access_token.into(),
        }
    }

    /// `…/directions/v5/mapbox/driving/{lng},{lat};{lng},{lat}?geometries=geojson&access_token=…`
    pub fn route_url(&self, start: LngLat, end: LngLat) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!(
            "/directions/v5/{}/{},{};{},{}",
            DRIVING_PROFILE, start.lng, start.lat, end.lng, end.lat
        ));
        url.query_pairs_mut()
            .clear()
            .append_pair("geometries", "geojson")
            .append_pair("access_token", &self.access_token);
        url
    }
}

impl<T: Transport> DirectionsProvider for DirectionsClient<T> {
    async fn fetch_route(&self, start: LngLat, end: LngLat) -> Result<RouteResult, DirectionsError> {
        tracing::debug!("Requesting route {} -> {}", start, end);

        let url = self.route_url(start, end);
        let response = self.transport.send(Request::get(url.as_str())).await?;
        if !response.ok() {
            return Err(DirectionsError::Status(response.status));
        }
        parse_directions(&response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DirectionsClient {
        let loader = ResourceLoader::new(Default::default()).unwrap();
        DirectionsClient::new(loader, Url::parse(DEFAULT_DIRECTIONS_URL).unwrap(), "pk.test")
    }

    #[test]
    fn test_route_url() {
        let url = client().route_url(LngLat::new(-73.5, 45.5), LngLat::new(-73.6, 45.6));
        assert_eq!(
            url.as_str(),
            "https://api.mapbox.com/directions/v5/mapbox/driving/-73.5,45.5;-73.6,45.6?geometries=geojson&access_token=pk.test"
        );
    }

    #[test]
    fn test_parse_best_route() {
        let body = br#"{
            "routes": [
                {"geometry": {"type": "LineString", "coordinates": [[-73.5, 45.5], [-73.6, 45.6]]}, "duration": 600, "distance": 5000},
                {"geometry": {"type": "LineString", "coordinates": [[0, 0]]}, "duration": 900, "distance": 7000}
            ],
            "code": "Ok"
        }"#;

        let route = parse_directions(body).unwrap();
        assert_eq!(route.geometry.unwrap(), vec![LngLat::new(-73.5, 45.5), LngLat::new(-73.6, 45.6)]);
        assert_eq!(route.duration_seconds, Some(600.0));
        assert_eq!(route.distance_meters, Some(5000.0));
    }

    #[test]
    fn test_parse_no_routes() {
        assert!(parse_directions(br#"{"routes": []}"#).unwrap().is_no_route());
        assert!(parse_directions(br#"{"code": "NoRoute"}"#).unwrap().is_no_route());
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_directions(b"<html>").unwrap_err();
        assert!(matches!(err, DirectionsError::Net(NetError::Decode(_))));
    }
}
