//! Permissions
//!
//! Geolocation permission as tracked by the session, and the raw state
//! reported by the platform permission capability.

/// Permission lifecycle of the position tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionState {
    /// Tracking has never been started
    Unrequested,
    /// A fix has been requested and the answer is outstanding
    Pending,
    /// The device is producing fixes
    Granted,
    /// The user or the OS declined location access
    Denied,
    /// No hardware, or the device could not produce a fix in time
    Unavailable,
}

impl PermissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unrequested => "unrequested",
            Self::Pending => "pending",
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Unavailable => "unavailable",
        }
    }

    /// Denied and unavailable are only left by user action.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Denied | Self::Unavailable)
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission state as reported by the platform's permission query or
/// change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformPermission {
    Granted,
    Denied,
    Prompt,
}

impl PlatformPermission {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "granted" => Some(Self::Granted),
            "denied" => Some(Self::Denied),
            "prompt" => Some(Self::Prompt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Prompt => "prompt",
        }
    }
}
