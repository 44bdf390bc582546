//! Device readings and the tracked position

use serde::{Deserialize, Serialize};

use crate::LngLat;

/// A single point-in-time reading from the device location capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub lat: f64,
    pub lng: f64,
    /// Accuracy radius in meters
    pub accuracy: Option<f64>,
    /// Degrees clockwise from true north
    pub heading: Option<f64>,
    /// Meters per second
    pub speed: Option<f64>,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: u64,
}

impl Fix {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            accuracy: None,
            heading: None,
            speed: None,
            timestamp: 0,
        }
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy = Some(meters);
        self
    }

    pub fn with_motion(mut self, heading: f64, speed: f64) -> Self {
        self.heading = Some(heading);
        self.speed = Some(speed);
        self
    }

    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// The current device position as seen by the session.
///
/// Produced only by [`PositionTracker`](crate::PositionTracker); each new
/// fix replaces the previous value wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
    pub captured_at: u64,
}

impl Position {
    pub fn lng_lat(&self) -> LngLat {
        LngLat::from_lat_lng(self.latitude, self.longitude)
    }
}

impl From<Fix> for Position {
    fn from(fix: Fix) -> Self {
        // Stationary devices report NaN heading
        let known = |v: Option<f64>| v.filter(|x| x.is_finite());

        Self {
            latitude: fix.lat,
            longitude: fix.lng,
            accuracy: known(fix.accuracy),
            heading: known(fix.heading),
            speed: known(fix.speed),
            captured_at: fix.timestamp,
        }
    }
}
