//! Position Tracker
//!
//! Permission-aware wrapper around a [`GeolocationDevice`].
//!
//! ```text
//! Unrequested --start--> Pending --fix--> Granted --fix--> Granted
//!                           |                |
//!                           +----error-------+--> Denied | Unavailable
//! ```
//!
//! At most one subscription is live at a time. Every device event carries
//! the subscription it was issued for and is dropped unless it matches
//! the live one, so nothing scheduled before [`PositionTracker::stop`]
//! can touch the position afterwards.

use crate::{
    DeviceEvent, Fix, GeolocationDevice, GeolocationError, GeolocationOptions, PermissionState,
    PlatformPermission, Position, Subscription,
};

/// What happens to the last known position when tracking stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopPolicy {
    /// Forget it; nothing is rendered for a stopped tracker
    #[default]
    ClearPosition,
    /// Keep showing the last fix
    RetainLastKnown,
}

/// Tracker configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerConfig {
    pub options: GeolocationOptions,
    pub stop_policy: StopPolicy,
}

/// Tracks the device position for one session
#[derive(Debug)]
pub struct PositionTracker<D: GeolocationDevice> {
    device: D,
    config: TrackerConfig,
    permission: PermissionState,
    position: Option<Position>,
    active: Option<Subscription>,
    next_subscription: u64,
}

impl<D: GeolocationDevice> PositionTracker<D> {
    /// Wrap a device. The platform permission is probed once here; after
    /// that the tracker only learns about changes through events.
    pub fn new(device: D, config: TrackerConfig) -> Self {
        let permission = if !device.is_available() {
            PermissionState::Unavailable
        } else if device.query_permission() == Some(PlatformPermission::Denied) {
            PermissionState::Denied
        } else {
            PermissionState::Unrequested
        };

        Self {
            device,
            config,
            permission,
            position: None,
            active: None,
            next_subscription: 1,
        }
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// The live subscription, if any
    pub fn subscription(&self) -> Option<Subscription> {
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Access for the event pump that drains the device
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Begin tracking.
    ///
    /// No-op while a subscription is live. Otherwise asks for a one-shot fix
    /// (which surfaces the permission prompt right away) and opens the
    /// continuous watch under a fresh subscription. Returns whether a new
    /// subscription was opened.
    pub fn start(&mut self) -> bool {
        if self.active.is_some() {
            return false;
        }
        if !self.device.is_available() {
            tracing::warn!("Geolocation is not available on this device");
            self.permission = PermissionState::Unavailable;
            return false;
        }

        let subscription = Subscription(self.next_subscription);
        self.next_subscription += 1;

        self.device.request_fix(subscription, &self.config.options);
        self.device.watch(subscription, &self.config.options);
        self.active = Some(subscription);
        self.permission = PermissionState::Pending;

        tracing::info!("Location tracking started ({})", subscription);
        true
    }

    /// Stop tracking. Idempotent.
    ///
    /// The watch is released before this returns; the position is kept or
    /// dropped according to [`StopPolicy`]. Returns whether a subscription
    /// was released.
    pub fn stop(&mut self) -> bool {
        let Some(subscription) = self.active.take() else {
            return false;
        };

        self.device.clear_watch(subscription);
        if self.permission == PermissionState::Pending {
            self.permission = PermissionState::Unrequested;
        }
        if self.config.stop_policy == StopPolicy::ClearPosition {
            self.position = None;
        }

        tracing::info!("Location tracking stopped ({})", subscription);
        true
    }

    /// Apply a device event. Returns whether tracker state changed.
    pub fn handle(&mut self, event: DeviceEvent) -> bool {
        match event {
            DeviceEvent::Fix {
                subscription,
                result,
                ..
            } => {
                if self.active != Some(subscription) {
                    tracing::debug!("Dropping fix for stale {}", subscription);
                    return false;
                }
                match result {
                    Ok(fix) => self.apply_fix(fix),
                    Err(error) => self.fail(error),
                }
                true
            }
            DeviceEvent::PermissionChanged(permission) => self.apply_permission(permission),
        }
    }

    fn apply_fix(&mut self, fix: Fix) {
        if self.permission != PermissionState::Granted {
            tracing::info!("Location permission granted");
        }
        self.permission = PermissionState::Granted;
        self.position = Some(Position::from(fix));
    }

    /// Errors end the subscription; the caller has to start again.
    fn fail(&mut self, error: GeolocationError) {
        tracing::warn!("Location error: {}", error);

        if let Some(subscription) = self.active.take() {
            self.device.clear_watch(subscription);
        }
        self.position = None;
        self.permission = match error {
            GeolocationError::PermissionDenied => PermissionState::Denied,
            GeolocationError::PositionUnavailable | GeolocationError::Timeout => {
                PermissionState::Unavailable
            }
        };
    }

    fn apply_permission(&mut self, permission: PlatformPermission) -> bool {
        let before = self.permission;
        match permission {
            PlatformPermission::Denied => {
                if let Some(subscription) = self.active.take() {
                    self.device.clear_watch(subscription);
                }
                self.position = None;
                self.permission = PermissionState::Denied;
            }
            PlatformPermission::Granted | PlatformPermission::Prompt => {
                if self.permission == PermissionState::Denied {
                    // Re-granted outside the app; start() must be called again
                    self.permission = PermissionState::Pending;
                } else if self.permission == PermissionState::Pending
                    && self.active.is_some()
                    && permission == PlatformPermission::Granted
                {
                    self.permission = PermissionState::Granted;
                }
            }
        }

        if before != self.permission {
            tracing::info!("Location permission {} -> {}", before, self.permission);
        }
        before != self.permission || permission == PlatformPermission::Denied
    }
}

impl<D: GeolocationDevice> Drop for PositionTracker<D> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixKind, LngLat, SimulatedDevice};

    fn tracker(fixes: Vec<Fix>) -> PositionTracker<SimulatedDevice> {
        PositionTracker::new(SimulatedDevice::with_track(fixes), TrackerConfig::default())
    }

    fn pump(tracker: &mut PositionTracker<SimulatedDevice>, ms: u64) {
        for event in tracker.device_mut().advance(ms) {
            tracker.handle(event);
        }
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut t = tracker(vec![]);
        assert_eq!(t.permission(), PermissionState::Unrequested);

        assert!(t.start());
        let sub = t.subscription();
        assert!(!t.start());
        assert_eq!(t.subscription(), sub);
        assert_eq!(t.device().active_watches(), 1);
        assert_eq!(t.permission(), PermissionState::Pending);
    }

    #[test]
    fn test_fix_grants_and_sets_position() {
        let mut t = tracker(vec![Fix::new(45.5, -73.5)]);
        t.start();
        pump(&mut t, 100);

        assert_eq!(t.permission(), PermissionState::Granted);
        assert_eq!(t.position().unwrap().lng_lat(), LngLat::new(-73.5, 45.5));
    }

    #[test]
    fn test_stop_clears_position_by_default() {
        let mut t = tracker(vec![Fix::new(45.5, -73.5)]);
        t.start();
        pump(&mut t, 100);

        assert!(t.stop());
        assert!(!t.stop());
        assert!(t.position().is_none());
        assert_eq!(t.device().active_watches(), 0);
        assert_eq!(t.permission(), PermissionState::Granted);
    }

    #[test]
    fn test_stop_can_retain_last_known() {
        let config = TrackerConfig {
            stop_policy: StopPolicy::RetainLastKnown,
            ..Default::default()
        };
        let mut t = PositionTracker::new(
            SimulatedDevice::with_track(vec![Fix::new(45.5, -73.5)]),
            config,
        );
        t.start();
        pump(&mut t, 100);
        t.stop();

        assert!(t.position().is_some());
    }

    #[test]
    fn test_stop_while_pending_returns_to_unrequested() {
        let mut t = tracker(vec![]);
        t.start();
        t.stop();
        assert_eq!(t.permission(), PermissionState::Unrequested);
    }

    #[test]
    fn test_event_from_previous_subscription_is_dropped() {
        let mut t = tracker(vec![]);
        t.start();
        let old = t.subscription().unwrap();
        t.stop();
        t.start();

        let changed = t.handle(DeviceEvent::Fix {
            subscription: old,
            kind: FixKind::Watch,
            result: Ok(Fix::new(1.0, 1.0)),
        });
        assert!(!changed);
        assert!(t.position().is_none());
    }

    #[test]
    fn test_timeout_makes_unavailable_and_releases() {
        let mut t = tracker(vec![]);
        t.start();
        pump(&mut t, 10_000);

        assert_eq!(t.permission(), PermissionState::Unavailable);
        assert!(!t.is_active());
        assert_eq!(t.device().active_watches(), 0);

        // Not retried on its own, but start() works again
        assert!(t.start());
    }

    #[test]
    fn test_unavailable_hardware() {
        let mut t = PositionTracker::new(SimulatedDevice::unavailable(), TrackerConfig::default());
        assert_eq!(t.permission(), PermissionState::Unavailable);
        assert!(!t.start());
        assert!(!t.is_active());
    }
}
