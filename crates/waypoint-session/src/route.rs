//! Route Resolution
//!
//! Turns the current (start, end) pair into at most one authoritative
//! directions request. Each request carries the generation it was issued
//! under; a result is applied only if that generation is still current,
//! so a slow answer for an old pair can never overwrite a newer one.

use std::time::Duration;

use waypoint_geo::LngLat;
use waypoint_net::{DirectionsError, DirectionsProvider, RouteResult};

/// The input pair a route belongs to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteKey {
    pub start: LngLat,
    pub end: LngLat,
}

/// A directions request issued by the resolver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteTicket {
    generation: u64,
    key: RouteKey,
}

impl RouteTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn key(&self) -> RouteKey {
        self.key
    }

    /// Run the request against `provider`, giving up after `timeout`.
    pub async fn fetch<P: DirectionsProvider>(
        self,
        provider: &P,
        timeout: Duration,
    ) -> Result<RouteResult, DirectionsError> {
        smol::future::or(provider.fetch_route(self.key.start, self.key.end), async move {
            smol::Timer::after(timeout).await;
            Err(DirectionsError::Timeout(timeout))
        })
        .await
    }
}

/// Where the resolver stands for the current pair
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RouteStatus {
    /// An input is missing; nothing is requested or held
    #[default]
    Disabled,
    /// Waiting for the provider
    Loading,
    Ready(RouteResult),
    /// The last request failed; retried when resolution is triggered again
    Unavailable,
}

/// Directions request bookkeeping
#[derive(Debug, Default)]
pub struct RouteResolver {
    generation: u64,
    key: Option<RouteKey>,
    status: RouteStatus,
}

impl RouteResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the resolver at a new pair of inputs.
    ///
    /// With either input missing the resolver is disabled. An unchanged pair
    /// keeps its in-flight request or cached result, unless the last attempt
    /// failed. Any other pair abandons whatever was outstanding and returns
    /// the ticket for the new request.
    pub fn resolve(&mut self, start: Option<LngLat>, end: Option<LngLat>) -> Option<RouteTicket> {
        let (Some(start), Some(end)) = (start, end) else {
            self.disable();
            return None;
        };
        let key = RouteKey { start, end };

        if self.key == Some(key) && self.status != RouteStatus::Unavailable {
            return None;
        }

        self.generation += 1;
        self.key = Some(key);
        self.status = RouteStatus::Loading;

        Some(RouteTicket {
            generation: self.generation,
            key,
        })
    }

    /// Drop inputs, result and any outstanding request
    pub fn disable(&mut self) {
        if self.key.take().is_some() {
            self.generation += 1;
        }
        self.status = RouteStatus::Disabled;
    }

    /// Deliver the outcome of a ticket. Returns whether it was applied;
    /// outcomes for superseded tickets are dropped quietly.
    pub fn complete(&mut self, ticket: RouteTicket, result: Result<RouteResult, DirectionsError>) -> bool {
        if ticket.generation != self.generation || self.key != Some(ticket.key) {
            tracing::debug!("Dropping route for superseded request #{}", ticket.generation);
            return false;
        }

        self.status = match result {
            Ok(route) => {
                if route.is_no_route() {
                    tracing::info!("Provider found no route");
                }
                RouteStatus::Ready(route)
            }
            Err(e) => {
                tracing::warn!("{}", e);
                RouteStatus::Unavailable
            }
        };
        true
    }

    pub fn status(&self) -> &RouteStatus {
        &self.status
    }

    /// Route for the current pair, once it has arrived
    pub fn result(&self) -> Option<&RouteResult> {
        match &self.status {
            RouteStatus::Ready(route) => Some(route),
            _ => None,
        }
    }

    pub fn current_key(&self) -> Option<RouteKey> {
        self.key
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }
}
