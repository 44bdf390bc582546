//! Navigation Session
//!
//! Owns the tracker, the selector, the resolver and the map renderer, and
//! recomposes the view-model whenever one of them changes.

use waypoint_geo::{DeviceEvent, GeolocationDevice, LngLat, PermissionState, PositionTracker};
use waypoint_net::{DirectionsError, HistoryError, HistoryRecord, HistoryStore, RouteResult};

use crate::view::ViewInputs;
use crate::{
    Destination, DestinationCandidate, DestinationSelector, MapRenderer, MapSurface, RouteResolver,
    RouteStatus, RouteTicket, SelectionError, SessionConfig, ViewModel,
};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum SessionPhase {
    #[default]
    SelectingDestination,
    Navigating,
    /// Arrived within the configured radius
    Completed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelectingDestination => "selecting destination",
            Self::Navigating => "navigating",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the last navigation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Cancelled,
    Completed,
}

/// Session error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("No destination selected")]
    NoDestination,

    #[error("Not allowed while {0}")]
    WrongPhase(SessionPhase),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Persist(#[from] HistoryError),
}

/// One navigation session, from destination choice to arrival or cancel
#[derive(Debug)]
pub struct NavigationSession<D: GeolocationDevice, M: MapSurface> {
    config: SessionConfig,
    tracker: PositionTracker<D>,
    selector: DestinationSelector,
    resolver: RouteResolver,
    renderer: MapRenderer<M>,
    phase: SessionPhase,
    last_outcome: Option<SessionOutcome>,
    blocking_error: Option<String>,
    /// Route request waiting to be picked up by the event loop
    outbox: Option<RouteTicket>,
    view: ViewModel,
}

impl<D: GeolocationDevice, M: MapSurface> NavigationSession<D, M> {
    pub fn new(device: D, surface: M, config: SessionConfig) -> Self {
        let tracker = PositionTracker::new(device, config.tracker.clone());
        let renderer = MapRenderer::new(surface, config.initial_zoom);

        let mut session = Self {
            config,
            tracker,
            selector: DestinationSelector::new(),
            resolver: RouteResolver::new(),
            renderer,
            phase: SessionPhase::SelectingDestination,
            last_outcome: None,
            blocking_error: None,
            outbox: None,
            view: ViewModel::default(),
        };
        session.render();
        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn last_outcome(&self) -> Option<SessionOutcome> {
        self.last_outcome
    }

    /// The most recently composed view-model
    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn tracker(&self) -> &PositionTracker<D> {
        &self.tracker
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.selector.selected()
    }

    pub fn route_status(&self) -> &RouteStatus {
        self.resolver.status()
    }

    pub fn renderer(&self) -> &MapRenderer<M> {
        &self.renderer
    }

    pub fn surface_mut(&mut self) -> &mut M {
        self.renderer.surface_mut()
    }

    pub fn blocking_error(&self) -> Option<&str> {
        self.blocking_error.as_deref()
    }

    pub fn device(&self) -> &D {
        self.tracker.device()
    }

    pub fn device_mut(&mut self) -> &mut D {
        self.tracker.device_mut()
    }

    /// A destination is selected and nothing is underway yet
    pub fn can_navigate(&self) -> bool {
        self.phase == SessionPhase::SelectingDestination && self.selector.selected().is_some()
    }

    // ---- location ----

    pub fn start_tracking(&mut self) -> bool {
        let started = self.tracker.start();
        self.refresh();
        started
    }

    /// Release the location watch. Selection and phase are unaffected.
    pub fn stop_tracking(&mut self) -> bool {
        let stopped = self.tracker.stop();
        self.refresh();
        stopped
    }

    /// Feed a device callback through the tracker
    pub fn handle_device_event(&mut self, event: DeviceEvent) -> bool {
        if !self.tracker.handle(event) {
            return false;
        }
        self.refresh();
        true
    }

    // ---- destination ----

    pub fn select_destination(&mut self, candidate: DestinationCandidate) -> Result<(), SessionError> {
        self.require_phase(SessionPhase::SelectingDestination)?;
        self.selector.select(candidate)?;
        self.refresh();
        Ok(())
    }

    /// The search box text changed. Returns whether the selection was dropped.
    pub fn edit_query(&mut self, text: &str) -> bool {
        if self.phase != SessionPhase::SelectingDestination || !self.selector.edit_query(text) {
            return false;
        }
        self.refresh();
        true
    }

    pub fn clear_destination(&mut self) -> Result<(), SessionError> {
        self.require_phase(SessionPhase::SelectingDestination)?;
        if self.selector.clear().is_some() {
            self.refresh();
        }
        Ok(())
    }

    /// Recent destinations for the prefill list
    pub async fn recent_destinations<H: HistoryStore>(
        &self,
        store: &H,
    ) -> Result<Vec<HistoryRecord>, SessionError> {
        Ok(store.fetch_recent(self.config.history_limit).await?)
    }

    // ---- lifecycle ----

    /// Record the selected destination in history, then start navigating.
    ///
    /// A failed save leaves the session where it was and keeps the error on
    /// the view until [`dismiss_error`](Self::dismiss_error) or the next
    /// successful attempt.
    pub async fn start_navigation<H: HistoryStore>(&mut self, store: &H) -> Result<(), SessionError> {
        self.require_phase(SessionPhase::SelectingDestination)?;
        let Some(destination) = self.selector.selected() else {
            return Err(SessionError::NoDestination);
        };
        let name = destination.name().to_string();
        let entry = destination.to_history_entry();

        if let Err(e) = store.save(&entry).await {
            self.blocking_error = Some(e.to_string());
            self.render();
            return Err(e.into());
        }

        self.blocking_error = None;
        self.last_outcome = None;
        self.phase = SessionPhase::Navigating;
        tracing::info!("Navigating to {}", name);
        self.refresh();
        Ok(())
    }

    /// Select a history record and navigate to it right away
    pub async fn navigate_to_history<H: HistoryStore>(
        &mut self,
        record: &HistoryRecord,
        store: &H,
    ) -> Result<(), SessionError> {
        self.require_phase(SessionPhase::SelectingDestination)?;
        self.selector.select_from_history(record)?;
        self.refresh();
        self.start_navigation(store).await
    }

    /// The user's stop action. Also leaves the arrival screen.
    ///
    /// Clears the selection and returns to destination selection. The
    /// tracker keeps running and history is not touched.
    pub fn stop_navigation(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Navigating => {
                tracing::info!("Navigation cancelled");
                self.last_outcome = Some(SessionOutcome::Cancelled);
            }
            SessionPhase::Completed => {}
            SessionPhase::SelectingDestination => {
                return Err(SessionError::WrongPhase(self.phase));
            }
        }

        self.selector.clear();
        self.phase = SessionPhase::SelectingDestination;
        self.refresh();
        Ok(())
    }

    // ---- route ----

    /// Take the route request issued by the last change, if any
    pub fn take_route_request(&mut self) -> Option<RouteTicket> {
        self.outbox.take()
    }

    /// Deliver a finished route request. Returns whether it was applied.
    ///
    /// A failure is not retried from here; the next position update or
    /// destination change triggers the next attempt.
    pub fn complete_route(
        &mut self,
        ticket: RouteTicket,
        result: Result<RouteResult, DirectionsError>,
    ) -> bool {
        if !self.resolver.complete(ticket, result) {
            return false;
        }
        self.render();
        true
    }

    // ---- map ----

    /// The map finished loading; applies everything rendered so far
    pub fn map_loaded(&mut self) -> usize {
        self.renderer.on_load()
    }

    pub fn dismiss_error(&mut self) {
        if self.blocking_error.take().is_some() {
            self.render();
        }
    }

    fn require_phase(&self, phase: SessionPhase) -> Result<(), SessionError> {
        if self.phase != phase {
            return Err(SessionError::WrongPhase(self.phase));
        }
        Ok(())
    }

    /// Position to route from: only a granted, live fix counts
    fn user_location(&self) -> Option<LngLat> {
        match self.tracker.permission() {
            PermissionState::Granted => self.tracker.position().map(|p| p.lng_lat()),
            _ => None,
        }
    }

    fn refresh(&mut self) {
        if self.phase == SessionPhase::Navigating {
            self.check_arrival();
        }

        if self.phase == SessionPhase::Navigating {
            let start = self.user_location();
            let end = self.selector.selected().map(Destination::coordinates);
            if let Some(ticket) = self.resolver.resolve(start, end) {
                tracing::debug!("Route request #{} issued", ticket.generation());
                self.outbox = Some(ticket);
            }
        } else {
            self.resolver.disable();
            self.outbox = None;
        }

        self.render();
    }

    fn check_arrival(&mut self) {
        let (Some(user), Some(destination)) = (self.user_location(), self.selector.selected()) else {
            return;
        };
        let remaining = user.distance_to(&destination.coordinates());
        if remaining <= self.config.arrival_radius_m {
            tracing::info!("Arrived at {} ({:.0} m)", destination.name(), remaining);
            self.phase = SessionPhase::Completed;
            self.last_outcome = Some(SessionOutcome::Completed);
        }
    }

    fn render(&mut self) {
        self.view = ViewModel::compose(ViewInputs {
            phase: self.phase,
            permission: self.tracker.permission(),
            tracking: self.tracker.is_active(),
            position: self.tracker.position(),
            destination: self.selector.selected(),
            route: self.resolver.status(),
            follow_user: self.config.follow_user,
            blocking_error: self.blocking_error.as_deref(),
        });
        self.renderer.render(&self.view);
    }
}
