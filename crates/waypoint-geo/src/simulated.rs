//! Simulated Geolocation
//!
//! A scripted device that replays a recorded track. Time only moves when
//! [`SimulatedDevice::advance`] is called, which keeps maximum-age and
//! timeout behavior deterministic.

use std::collections::VecDeque;

use crate::{
    DeviceEvent, Fix, FixKind, GeolocationDevice, GeolocationError, GeolocationOptions,
    PlatformPermission, Subscription,
};

/// One-shot request waiting for an answer
#[derive(Debug)]
struct PendingFix {
    subscription: Subscription,
    options: GeolocationOptions,
    issued_at: u64,
}

/// Scripted geolocation device
#[derive(Debug)]
pub struct SimulatedDevice {
    available: bool,
    permission: PlatformPermission,
    /// What the user answers when prompted
    prompt_answer: PlatformPermission,
    track: VecDeque<Fix>,
    cached: Option<Fix>,
    pending: Vec<PendingFix>,
    watches: Vec<(Subscription, GeolocationOptions)>,
    notifications: VecDeque<DeviceEvent>,
    /// Milliseconds since the Unix epoch
    now_ms: u64,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self {
            available: true,
            permission: PlatformPermission::Prompt,
            prompt_answer: PlatformPermission::Granted,
            track: VecDeque::new(),
            cached: None,
            pending: Vec::new(),
            watches: Vec::new(),
            notifications: VecDeque::new(),
            now_ms: 0,
        }
    }

    /// A device with no location hardware
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn with_track(fixes: impl IntoIterator<Item = Fix>) -> Self {
        let mut device = Self::new();
        device.track.extend(fixes);
        device
    }

    /// Start the clock at a given epoch time
    pub fn starting_at(mut self, now_ms: u64) -> Self {
        self.now_ms = now_ms;
        self
    }

    /// Answer future permission prompts with `answer`
    pub fn answer_prompts_with(&mut self, answer: PlatformPermission) {
        self.prompt_answer = answer;
    }

    /// Permission changed outside the app (OS settings)
    pub fn change_permission(&mut self, permission: PlatformPermission) {
        self.permission = permission;
        self.notifications
            .push_back(DeviceEvent::PermissionChanged(permission));
    }

    /// Append a fix to the end of the track
    pub fn push_fix(&mut self, fix: Fix) {
        self.track.push_back(fix);
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// No recorded fixes left
    pub fn is_exhausted(&self) -> bool {
        self.track.is_empty()
    }

    /// Registered watches
    pub fn active_watches(&self) -> usize {
        self.watches.len()
    }

    /// Outstanding one-shot requests
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Move the clock forward and collect everything the device reports.
    ///
    /// At most one new fix is taken from the track per call. It feeds every
    /// watch and any one-shot request that cannot be served from cache.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<DeviceEvent> {
        self.now_ms += elapsed_ms;
        let mut events: Vec<DeviceEvent> = self.notifications.drain(..).collect();

        if self.pending.is_empty() && self.watches.is_empty() {
            return events;
        }

        if self.permission == PlatformPermission::Prompt {
            self.permission = self.prompt_answer;
            events.push(DeviceEvent::PermissionChanged(self.permission));
        }

        if self.permission == PlatformPermission::Denied {
            self.fail_all(&mut events, GeolocationError::PermissionDenied);
            return events;
        }

        let fresh = self.track.pop_front().map(|mut fix| {
            if fix.timestamp == 0 {
                fix.timestamp = self.now_ms;
            }
            fix
        });
        if let Some(fix) = &fresh {
            self.cached = Some(fix.clone());
        }

        let now = self.now_ms;
        let cached = self.cached.clone();
        self.pending.retain(|req| {
            let from_cache = cached
                .as_ref()
                .filter(|fix| now.saturating_sub(fix.timestamp) <= req.options.maximum_age_ms);

            let result = if let Some(fix) = fresh.as_ref().or(from_cache) {
                Ok(fix.clone())
            } else if now.saturating_sub(req.issued_at) >= req.options.timeout_ms {
                Err(GeolocationError::Timeout)
            } else {
                return true;
            };

            events.push(DeviceEvent::Fix {
                subscription: req.subscription,
                kind: FixKind::OneShot,
                result,
            });
            false
        });

        if let Some(fix) = fresh {
            for (subscription, _) in &self.watches {
                events.push(DeviceEvent::Fix {
                    subscription: *subscription,
                    kind: FixKind::Watch,
                    result: Ok(fix.clone()),
                });
            }
        }

        events
    }

    fn fail_all(&mut self, events: &mut Vec<DeviceEvent>, error: GeolocationError) {
        for req in self.pending.drain(..) {
            events.push(DeviceEvent::Fix {
                subscription: req.subscription,
                kind: FixKind::OneShot,
                result: Err(error),
            });
        }
        for (subscription, _) in &self.watches {
            events.push(DeviceEvent::Fix {
                subscription: *subscription,
                kind: FixKind::Watch,
                result: Err(error),
            });
        }
    }
}

impl GeolocationDevice for SimulatedDevice {
    fn is_available(&self) -> bool {
        self.available
    }

    fn query_permission(&self) -> Option<PlatformPermission> {
        Some(self.permission)
    }

    fn request_fix(&mut self, subscription: Subscription, options: &GeolocationOptions) {
        self.pending.push(PendingFix {
            subscription,
            options: options.clone(),
            issued_at: self.now_ms,
        });
    }

    fn watch(&mut self, subscription: Subscription, options: &GeolocationOptions) {
        self.watches.push((subscription, options.clone()));
    }

    fn clear_watch(&mut self, subscription: Subscription) {
        self.watches.retain(|(s, _)| *s != subscription);
        self.pending.retain(|req| req.subscription != subscription);
    }
}
