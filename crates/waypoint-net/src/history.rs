//! Address History
//!
//! Client for the REST API that remembers previously used destinations.
//! Records store latitude and longitude as separate fields; use
//! [`HistoryRecord::lng_lat`] to get the canonical pair.

use std::future::Future;

use serde::{Deserialize, Serialize};
use url::Url;
use waypoint_geo::LngLat;

use crate::{NetError, Request, ResourceLoader, Transport};

const HISTORY_PATH: &str = "addressHistory";

/// A stored destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: i64,
    pub address_text: String,
    /// ISO-8601 timestamp of last use
    #[serde(default)]
    pub last_used: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl HistoryRecord {
    pub fn lng_lat(&self) -> LngLat {
        LngLat::from_lat_lng(self.latitude, self.longitude)
    }
}

/// Body of a save request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHistoryEntry {
    pub address_text: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl NewHistoryEntry {
    pub fn new(address_text: impl Into<String>, at: LngLat) -> Self {
        Self {
            address_text: address_text.into(),
            longitude: at.lng,
            latitude: at.lat,
        }
    }

    pub fn lng_lat(&self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }
}

/// History error.
///
/// Callers only see a generic message; the cause is kept as the source.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HistoryError {
    #[error("Failed to fetch history")]
    Fetch(#[source] NetError),

    #[error("Failed to save history")]
    Save(#[source] NetError),
}

/// Persistence for used destinations
pub trait HistoryStore {
    /// Most recent entries first
    fn fetch_recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<HistoryRecord>, HistoryError>>;

    /// Store an entry and return the created record
    fn save(
        &self,
        entry: &NewHistoryEntry,
    ) -> impl Future<Output = Result<HistoryRecord, HistoryError>>;
}

/// REST client for `/addressHistory`
#[derive(Debug, Clone)]
pub struct HistoryClient<T = ResourceLoader> {
    transport: T,
    endpoint: Url,
}

impl<T: Transport> HistoryClient<T> {
    pub fn new(transport: T, mut base: Url) -> Self {
        // Url::join drops the last segment unless the path ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(HISTORY_PATH).unwrap_or(base);

        Self { transport, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send(&self, request: Request) -> Result<crate::Response, NetError> {
        let response = self.transport.send(request).await?;
        if !response.ok() {
            return Err(NetError::HttpError { status: response.status });
        }
        Ok(response)
    }
}

impl<T: Transport> HistoryStore for HistoryClient<T> {
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, HistoryError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("limit", &limit.to_string());

        self.send(Request::get(url.as_str()))
            .await
            .and_then(|response| response.json())
            .map_err(|e| {
                tracing::warn!("Error fetching address history: {}", e);
                HistoryError::Fetch(e)
            })
    }

    async fn save(&self, entry: &NewHistoryEntry) -> Result<HistoryRecord, HistoryError> {
        let body = serde_json::to_vec(entry).map_err(|e| HistoryError::Save(NetError::Decode(e.to_string())))?;
        let request = Request::post(self.endpoint.as_str()).with_json(body);

        self.send(request)
            .await
            .and_then(|response| response.json())
            .map_err(|e| {
                tracing::warn!("Error saving address history: {}", e);
                HistoryError::Save(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HistoryClient {
        let loader = ResourceLoader::new(Default::default()).unwrap();
        HistoryClient::new(loader, Url::parse(base).unwrap())
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        assert_eq!(client("http://localhost:3000").endpoint().as_str(), "http://localhost:3000/addressHistory");
        assert_eq!(client("http://localhost:3000/api").endpoint().as_str(), "http://localhost:3000/api/addressHistory");
        assert_eq!(client("http://localhost:3000/api/").endpoint().as_str(), "http://localhost:3000/api/addressHistory");
    }

    #[test]
    fn test_record_wire_format() {
        let json = r#"{"id": 7, "addressText": "Jean-Talon Market", "lastUsed": "2025-11-02T10:00:00Z", "latitude": 45.536, "longitude": -73.615}"#;
        let record: HistoryRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, 7);
        assert_eq!(record.lng_lat(), LngLat::new(-73.615, 45.536));
    }

    #[test]
    fn test_entry_wire_format() {
        let entry = NewHistoryEntry::new("Home", LngLat::new(-73.5, 45.5));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"addressText": "Home", "longitude": -73.5, "latitude": 45.5}));
    }
}
