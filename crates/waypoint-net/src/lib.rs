//! Waypoint Networking
//!
//! HTTP plumbing and the two remote collaborators of a navigation session:
//! the directions provider and the address history API.

pub mod loader;
mod directions;
mod history;

pub use directions::{
    parse_directions, DirectionsClient, DirectionsError, DirectionsProvider, RouteResult,
    DEFAULT_DIRECTIONS_URL,
};
pub use history::{HistoryClient, HistoryError, HistoryRecord, HistoryStore, NewHistoryEntry};
pub use loader::{LoaderConfig, Method, Request, ResourceLoader, Transport};
pub use url::Url;

/// HTTP Response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Check if response is OK (2xx)
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, NetError> {
        serde_json::from_slice(&self.body).map_err(|e| NetError::Decode(e.to_string()))
    }
}

/// Network error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetError {
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Malformed response body: {0}")]
    Decode(String),
}
