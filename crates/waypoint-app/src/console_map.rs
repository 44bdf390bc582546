//! Map surface that writes to the log

use waypoint_session::{MapCommand, MapSurface};

/// Logs every map mutation instead of drawing it
#[derive(Debug, Default)]
pub struct ConsoleMap {
    applied: usize,
}

impl ConsoleMap {
    pub fn applied(&self) -> usize {
        self.applied
    }
}

impl MapSurface for ConsoleMap {
    fn apply(&mut self, command: &MapCommand) {
        self.applied += 1;
        match command {
            MapCommand::SetCamera { center, zoom: Some(zoom) } => {
                tracing::info!(target: "map", "camera {} (zoom {})", center, zoom)
            }
            MapCommand::SetCamera { center, zoom: None } => tracing::info!(target: "map", "camera {}", center),
            MapCommand::AddMarker { role, at } => tracing::info!(target: "map", "+ {:?} marker at {}", role, at),
            MapCommand::MoveMarker { role, at } => tracing::debug!(target: "map", "{:?} marker -> {}", role, at),
            MapCommand::RemoveMarker { role } => tracing::info!(target: "map", "- {:?} marker", role),
            MapCommand::AddLine { layer, path } => {
                tracing::info!(target: "map", "+ line '{}' ({} points)", layer, path.len())
            }
            MapCommand::UpdateLine { layer, path } => {
                tracing::info!(target: "map", "line '{}' updated ({} points)", layer, path.len())
            }
            MapCommand::RemoveLine { layer } => tracing::info!(target: "map", "- line '{}'", layer),
        }
    }
}
