//! Session Configuration

use std::time::Duration;

use waypoint_geo::TrackerConfig;

/// Session configuration options
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Geolocation options and stop policy
    pub tracker: TrackerConfig,

    /// Keep the camera on the user while a position is known
    pub follow_user: bool,

    /// Give up on a directions request after this long
    pub route_timeout: Duration,

    /// Distance to the destination that counts as arrival (meters)
    pub arrival_radius_m: f64,

    /// Entries shown in the recent destinations list
    pub history_limit: usize,

    /// Zoom applied with the first camera move
    pub initial_zoom: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            follow_user: true,
            route_timeout: Duration::from_secs(10),
            arrival_radius_m: 25.0,
            history_limit: 5,
            initial_zoom: 14.0,
        }
    }
}
