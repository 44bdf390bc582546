//! Device Location Capability
//!
//! The seam between the tracker and whatever produces fixes. Requests are
//! registered against a [`Subscription`] chosen by the caller; results come
//! back later as [`DeviceEvent`]s tagged with that subscription, so a
//! consumer can tell a live callback from one left over after cancellation.

use crate::{Fix, PlatformPermission};

/// Options passed with every fix request and watch registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeolocationOptions {
    /// Trade battery for precision
    pub enable_high_accuracy: bool,
    /// Reuse a cached fix up to this old
    pub maximum_age_ms: u64,
    /// Fail if no fix arrives within this window
    pub timeout_ms: u64,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            maximum_age_ms: 2_000,
            timeout_ms: 10_000,
        }
    }
}

/// Geolocation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("User denied geolocation permission")]
    PermissionDenied,

    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Geolocation request timed out")]
    Timeout,
}

impl GeolocationError {
    /// Map a W3C `GeolocationPositionError.code`
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            3 => Self::Timeout,
            _ => Self::PositionUnavailable,
        }
    }
}

/// Identity of one tracking session on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subscription(pub u64);

impl std::fmt::Display for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Which registration produced a fix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixKind {
    OneShot,
    Watch,
}

/// Something the device reports back asynchronously
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// Result of a one-shot request or a watch update
    Fix {
        subscription: Subscription,
        kind: FixKind,
        result: Result<Fix, GeolocationError>,
    },
    /// Permission change notification, independent of any request
    PermissionChanged(PlatformPermission),
}

/// Device location capability.
///
/// Implementations never call back synchronously; everything they produce
/// is delivered later through the event loop as [`DeviceEvent`]s.
pub trait GeolocationDevice {
    /// Whether location hardware exists at all
    fn is_available(&self) -> bool;

    /// Startup probe of the permission state, if the platform exposes one
    fn query_permission(&self) -> Option<PlatformPermission> {
        None
    }

    /// Request a single fix
    fn request_fix(&mut self, subscription: Subscription, options: &GeolocationOptions);

    /// Register a continuous watch
    fn watch(&mut self, subscription: Subscription, options: &GeolocationOptions);

    /// Release the watch and any outstanding one-shot request
    fn clear_watch(&mut self, subscription: Subscription);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = GeolocationOptions::default();
        assert!(opts.enable_high_accuracy);
        assert_eq!(opts.maximum_age_ms, 2_000);
        assert_eq!(opts.timeout_ms, 10_000);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(GeolocationError::from_code(1), GeolocationError::PermissionDenied);
        assert_eq!(GeolocationError::from_code(2), GeolocationError::PositionUnavailable);
        assert_eq!(GeolocationError::from_code(3), GeolocationError::Timeout);
        assert_eq!(GeolocationError::from_code(42), GeolocationError::PositionUnavailable);
    }
}
