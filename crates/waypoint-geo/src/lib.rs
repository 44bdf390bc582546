//! Waypoint Geolocation
//!
//! Canonical coordinates, the device location capability and the
//! permission-aware position tracker built on top of it.
//!
//! # Example
//! ```rust
//! use waypoint_geo::{Fix, PermissionState, PositionTracker, SimulatedDevice, TrackerConfig};
//!
//! let device = SimulatedDevice::with_track(vec![Fix::new(45.5, -73.5)]);
//! let mut tracker = PositionTracker::new(device, TrackerConfig::default());
//! tracker.start();
//!
//! for event in tracker.device_mut().advance(1000) {
//!     tracker.handle(event);
//! }
//! assert_eq!(tracker.permission(), PermissionState::Granted);
//! ```

mod coords;
mod device;
mod permissions;
mod position;
mod simulated;
mod tracker;

pub use coords::LngLat;
pub use device::{
    DeviceEvent, FixKind, GeolocationDevice, GeolocationError, GeolocationOptions, Subscription,
};
pub use permissions::{PermissionState, PlatformPermission};
pub use position::{Fix, Position};
pub use simulated::SimulatedDevice;
pub use tracker::{PositionTracker, StopPolicy, TrackerConfig};
