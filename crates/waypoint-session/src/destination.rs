//! Destination Selection
//!
//! Holds the single chosen destination. Selections arrive from the geocoder
//! search box or from the history list; the last one wins.

use serde::{Deserialize, Serialize};
use waypoint_geo::LngLat;
use waypoint_net::{HistoryRecord, NewHistoryEntry};

/// Why a candidate was turned away
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error("destination has no name")]
    MissingName,

    #[error("destination has no coordinates")]
    MissingCoordinates,

    #[error("destination coordinates out of range: {0}")]
    InvalidCoordinates(LngLat),
}

/// A validated destination. Cannot exist without a name and valid
/// coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Destination {
    id: String,
    name: String,
    coordinates: LngLat,
}

impl Destination {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        coordinates: LngLat,
    ) -> Result<Self, SelectionError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SelectionError::MissingName);
        }
        if !coordinates.is_valid() {
            return Err(SelectionError::InvalidCoordinates(coordinates));
        }
        Ok(Self {
            id: id.into(),
            name,
            coordinates,
        })
    }

    /// Geocoder result id, or a history record id as a string
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coordinates(&self) -> LngLat {
        self.coordinates
    }

    pub fn to_history_entry(&self) -> NewHistoryEntry {
        NewHistoryEntry::new(self.name.clone(), self.coordinates)
    }
}

/// Unvalidated input from any selection source
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DestinationCandidate {
    pub id: String,
    pub name: Option<String>,
    pub coordinates: Option<LngLat>,
}

impl TryFrom<DestinationCandidate> for Destination {
    type Error = SelectionError;

    fn try_from(candidate: DestinationCandidate) -> Result<Self, Self::Error> {
        let name = candidate.name.ok_or(SelectionError::MissingName)?;
        let coordinates = candidate.coordinates.ok_or(SelectionError::MissingCoordinates)?;
        Destination::new(candidate.id, name, coordinates)
    }
}

impl From<&HistoryRecord> for DestinationCandidate {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            id: record.id.to_string(),
            name: Some(record.address_text.clone()),
            coordinates: Some(record.lng_lat()),
        }
    }
}

/// Geocoder "retrieve" payload (a GeoJSON feature)
#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderFeature {
    pub id: String,
    #[serde(default)]
    pub properties: FeatureProperties,
    pub geometry: Option<FeatureGeometry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureProperties {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureGeometry {
    /// `[lng, lat]`, possibly with extra members
    pub coordinates: Vec<f64>,
}

impl From<GeocoderFeature> for DestinationCandidate {
    fn from(feature: GeocoderFeature) -> Self {
        let coordinates = feature.geometry.and_then(|g| match g.coordinates.as_slice() {
            [lng, lat, ..] => Some(LngLat::new(*lng, *lat)),
            _ => None,
        });

        Self {
            id: feature.id,
            name: feature.properties.name,
            coordinates,
        }
    }
}

/// Owner of the current selection
#[derive(Debug, Default)]
pub struct DestinationSelector {
    selected: Option<Destination>,
}

impl DestinationSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&Destination> {
        self.selected.as_ref()
    }

    /// Replace the selection. An invalid candidate leaves the previous
    /// selection in place.
    pub fn select(&mut self, candidate: DestinationCandidate) -> Result<&Destination, SelectionError> {
        match Destination::try_from(candidate) {
            Ok(destination) => {
                tracing::info!("Destination selected: {} ({})", destination.name(), destination.coordinates());
                Ok(self.selected.insert(destination))
            }
            Err(e) => {
                tracing::warn!("Rejected destination: {}", e);
                Err(e)
            }
        }
    }

    /// Select a previously used destination
    pub fn select_from_history(&mut self, record: &HistoryRecord) -> Result<&Destination, SelectionError> {
        self.select(DestinationCandidate::from(record))
    }

    /// Drop the selection, returning what was selected
    pub fn clear(&mut self) -> Option<Destination> {
        self.selected.take()
    }

    /// The search text changed. A selection that no longer matches what the
    /// user sees is dropped. Returns whether it was.
    pub fn edit_query(&mut self, text: &str) -> bool {
        match &self.selected {
            Some(destination) if destination.name() != text.trim() => {
                tracing::debug!("Search text diverged from selection, clearing");
                self.selected = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: Option<&str>, at: Option<LngLat>) -> DestinationCandidate {
        DestinationCandidate {
            id: "poi.1".into(),
            name: name.map(String::from),
            coordinates: at,
        }
    }

    #[test]
    fn test_select_valid() {
        let mut selector = DestinationSelector::new();
        let dest = selector.select(candidate(Some("Cafe"), Some(LngLat::new(-73.6, 45.6)))).unwrap();

        assert_eq!(dest.name(), "Cafe");
        assert_eq!(dest.coordinates(), LngLat::new(-73.6, 45.6));
    }

    #[test]
    fn test_invalid_keeps_previous() {
        let mut selector = DestinationSelector::new();
        selector.select(candidate(Some("Cafe"), Some(LngLat::new(-73.6, 45.6)))).unwrap();

        assert_eq!(selector.select(candidate(Some(""), Some(LngLat::new(0.0, 0.0)))).unwrap_err(), SelectionError::MissingName);
        assert_eq!(selector.select(candidate(None, Some(LngLat::new(0.0, 0.0)))).unwrap_err(), SelectionError::MissingName);
        assert_eq!(selector.select(candidate(Some("X"), None)).unwrap_err(), SelectionError::MissingCoordinates);
        assert!(matches!(
            selector.select(candidate(Some("X"), Some(LngLat::new(0.0, 120.0)))),
            Err(SelectionError::InvalidCoordinates(_))
        ));

        assert_eq!(selector.selected().unwrap().name(), "Cafe");
    }

    #[test]
    fn test_edit_query() {
        let mut selector = DestinationSelector::new();
        assert!(!selector.edit_query("anything"));

        selector.select(candidate(Some("Cafe"), Some(LngLat::new(-73.6, 45.6)))).unwrap();
        assert!(!selector.edit_query("Cafe "));
        assert!(selector.selected().is_some());

        assert!(selector.edit_query("Caf"));
        assert!(selector.selected().is_none());
    }

    #[test]
    fn test_geocoder_feature() {
        let json = r#"{
            "type": "Feature",
            "id": "dXJuOm1ieHBvaTo",
            "properties": {"name": "Jean-Talon Market", "full_address": "7070 Av. Henri-Julien, Montréal"},
            "geometry": {"type": "Point", "coordinates": [-73.615, 45.536]}
        }"#;
        let feature: GeocoderFeature = serde_json::from_str(json).unwrap();
        let dest = Destination::try_from(DestinationCandidate::from(feature)).unwrap();

        assert_eq!(dest.id(), "dXJuOm1ieHBvaTo");
        assert_eq!(dest.coordinates(), LngLat::new(-73.615, 45.536));
    }

    #[test]
    fn test_geocoder_feature_without_name() {
        let json = r#"{"id": "x", "properties": {}, "geometry": {"coordinates": [1.0, 2.0]}}"#;
        let feature: GeocoderFeature = serde_json::from_str(json).unwrap();
        assert_eq!(
            Destination::try_from(DestinationCandidate::from(feature)).unwrap_err(),
            SelectionError::MissingName
        );
    }
}
