//! Waypoint Session
//!
//! The live navigation session. Three independently changing inputs (the
//! selected destination, the device position with its permission, and the
//! computed route) are reconciled into one view-model, which is rendered
//! onto a map surface that only accepts mutations after it has loaded.
//!
//! The session never spawns anything itself. Route lookups are handed out
//! as [`RouteTicket`]s through [`NavigationSession::take_route_request`];
//! the event loop runs them and feeds results back through
//! [`NavigationSession::complete_route`].

mod config;
mod destination;
mod map;
mod route;
mod session;
mod view;

pub use config::SessionConfig;
pub use destination::{
    Destination, DestinationCandidate, DestinationSelector, FeatureGeometry, FeatureProperties,
    GeocoderFeature, SelectionError,
};
pub use map::{MapCommand, MapRenderer, MapSurface, MarkerRole, RecordingSurface, ROUTE_LAYER_ID};
pub use route::{RouteKey, RouteResolver, RouteStatus, RouteTicket};
pub use session::{NavigationSession, SessionError, SessionOutcome, SessionPhase};
pub use view::{LocationBanner, RouteSummary, ViewModel};

pub use waypoint_geo as geo;
pub use waypoint_net as net;
