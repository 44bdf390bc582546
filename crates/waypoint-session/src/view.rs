//! View-model
//!
//! Pure projection of session state into what the screen shows.

use serde::Serialize;
use waypoint_geo::{LngLat, PermissionState, Position};
use waypoint_net::RouteResult;

use crate::{Destination, RouteStatus, SessionPhase};

/// Location status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LocationBanner {
    /// Tracking not started
    #[default]
    Off,
    /// Waiting for the first fix
    Locating,
    Live,
    Denied,
    Unavailable,
}

impl LocationBanner {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Off => "Location is off",
            Self::Locating => "Fetching your current location...",
            Self::Live => "Live location",
            Self::Denied => "Location permission denied",
            Self::Unavailable => "Location unavailable",
        }
    }
}

/// Duration and distance of the active route
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteSummary {
    pub duration_seconds: Option<f64>,
    pub distance_meters: Option<f64>,
}

/// Everything the navigation screen renders
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ViewModel {
    pub phase: SessionPhase,
    pub user_marker: Option<LngLat>,
    pub destination_marker: Option<LngLat>,
    pub destination_name: Option<String>,
    pub route_line: Option<Vec<LngLat>>,
    pub route_summary: Option<RouteSummary>,
    /// A route lookup is outstanding
    pub route_loading: bool,
    pub camera: Option<LngLat>,
    pub banner: LocationBanner,
    /// A destination is selected and the session is ready to start
    pub can_navigate: bool,
    /// Error the user has to see before anything else happens
    pub blocking_error: Option<String>,
}

/// Inputs to [`ViewModel::compose`]
pub(crate) struct ViewInputs<'a> {
    pub phase: SessionPhase,
    pub permission: PermissionState,
    /// The tracker holds a live subscription
    pub tracking: bool,
    pub position: Option<&'a Position>,
    pub destination: Option<&'a Destination>,
    pub route: &'a RouteStatus,
    pub follow_user: bool,
    pub blocking_error: Option<&'a str>,
}

impl ViewModel {
    pub(crate) fn compose(inputs: ViewInputs<'_>) -> Self {
        let user_marker = match (inputs.permission, inputs.position) {
            (PermissionState::Granted, Some(pos)) => Some(pos.lng_lat()),
            _ => None,
        };
        let destination_marker = inputs.destination.map(Destination::coordinates);

        let route: Option<&RouteResult> = match inputs.route {
            RouteStatus::Ready(route) => Some(route),
            _ => None,
        };

        let camera = if inputs.follow_user {
            user_marker.or(destination_marker)
        } else {
            destination_marker
        };

        Self {
            phase: inputs.phase,
            user_marker,
            destination_marker,
            destination_name: inputs.destination.map(|d| d.name().to_string()),
            route_line: route.and_then(|r| r.geometry.clone()),
            route_summary: route.filter(|r| !r.is_no_route()).map(|r| RouteSummary {
                duration_seconds: r.duration_seconds,
                distance_meters: r.distance_meters,
            }),
            route_loading: *inputs.route == RouteStatus::Loading,
            camera,
            banner: banner(inputs.permission, inputs.tracking, inputs.position.is_some()),
            can_navigate: inputs.phase == SessionPhase::SelectingDestination && inputs.destination.is_some(),
            blocking_error: inputs.blocking_error.map(String::from),
        }
    }
}

fn banner(permission: PermissionState, tracking: bool, has_position: bool) -> LocationBanner {
    match permission {
        PermissionState::Unrequested => LocationBanner::Off,
        // Re-granted after a denial; nothing asks for a fix until restarted
        PermissionState::Pending if !tracking => LocationBanner::Off,
        PermissionState::Pending => LocationBanner::Locating,
        PermissionState::Granted if has_position => LocationBanner::Live,
        PermissionState::Granted => LocationBanner::Locating,
        PermissionState::Denied => LocationBanner::Denied,
        PermissionState::Unavailable => LocationBanner::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_geo::Fix;

    fn inputs<'a>(
        permission: PermissionState,
        position: Option<&'a Position>,
        destination: Option<&'a Destination>,
        route: &'a RouteStatus,
    ) -> ViewInputs<'a> {
        ViewInputs {
            phase: SessionPhase::Navigating,
            permission,
            tracking: permission != PermissionState::Unrequested,
            position,
            destination,
            route,
            follow_user: true,
            blocking_error: None,
        }
    }

    #[test]
    fn test_user_marker_requires_grant() {
        let pos = Position::from(Fix::new(45.5, -73.5));
        let status = RouteStatus::Disabled;

        let v = ViewModel::compose(inputs(PermissionState::Granted, Some(&pos), None, &status));
        assert_eq!(v.user_marker, Some(LngLat::new(-73.5, 45.5)));
        assert_eq!(v.banner, LocationBanner::Live);

        let v = ViewModel::compose(inputs(PermissionState::Pending, Some(&pos), None, &status));
        assert_eq!(v.user_marker, None);
    }

    #[test]
    fn test_camera_follows_user_or_destination() {
        let pos = Position::from(Fix::new(45.5, -73.5));
        let dest = Destination::new("d", "Dest", LngLat::new(-73.6, 45.6)).unwrap();
        let status = RouteStatus::Loading;

        let mut i = inputs(PermissionState::Granted, Some(&pos), Some(&dest), &status);
        assert_eq!(ViewModel::compose(i).camera, Some(LngLat::new(-73.5, 45.5)));

        i = inputs(PermissionState::Granted, Some(&pos), Some(&dest), &status);
        i.follow_user = false;
        let v = ViewModel::compose(i);
        assert_eq!(v.camera, Some(LngLat::new(-73.6, 45.6)));
        assert!(v.route_loading);

        let v = ViewModel::compose(inputs(PermissionState::Denied, None, Some(&dest), &status));
        assert_eq!(v.camera, Some(LngLat::new(-73.6, 45.6)));
        assert_eq!(v.banner, LocationBanner::Denied);
    }

    #[test]
    fn test_pending_without_watch_is_off() {
        let status = RouteStatus::Disabled;
        let mut i = inputs(PermissionState::Pending, None, None, &status);
        assert_eq!(ViewModel::compose(i).banner, LocationBanner::Locating);

        i = inputs(PermissionState::Pending, None, None, &status);
        i.tracking = false;
        assert_eq!(ViewModel::compose(i).banner, LocationBanner::Off);
    }

    #[test]
    fn test_no_route_has_no_line_or_summary() {
        let status = RouteStatus::Ready(RouteResult::no_route());
        let v = ViewModel::compose(inputs(PermissionState::Unrequested, None, None, &status));
        assert_eq!(v.route_line, None);
        assert_eq!(v.route_summary, None);
        assert_eq!(v.banner, LocationBanner::Off);
    }
}
