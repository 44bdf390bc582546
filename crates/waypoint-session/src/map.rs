//! Map Rendering
//!
//! The map widget is an external collaborator that loads asynchronously.
//! [`MapRenderer`] is the only thing allowed to mutate it: it diffs each
//! view-model against what it has already asked for and applies the
//! difference. Before the load signal only the scene is recorded; the load
//! applies it once, as the change from an empty map.

use waypoint_geo::LngLat;

use crate::ViewModel;

/// Fixed identifier of the route source and line layer
pub const ROUTE_LAYER_ID: &str = "route";

/// Marker slots on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerRole {
    User,
    Destination,
}

/// A single mutation of the map surface
#[derive(Debug, Clone, PartialEq)]
pub enum MapCommand {
    SetCamera { center: LngLat, zoom: Option<f64> },
    AddMarker { role: MarkerRole, at: LngLat },
    MoveMarker { role: MarkerRole, at: LngLat },
    RemoveMarker { role: MarkerRole },
    AddLine { layer: &'static str, path: Vec<LngLat> },
    UpdateLine { layer: &'static str, path: Vec<LngLat> },
    RemoveLine { layer: &'static str },
}

/// The rendering surface
pub trait MapSurface {
    fn apply(&mut self, command: &MapCommand);
}

/// Surface that keeps every command it receives
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    pub commands: Vec<MapCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received since the last call
    pub fn take(&mut self) -> Vec<MapCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl MapSurface for RecordingSurface {
    fn apply(&mut self, command: &MapCommand) {
        self.commands.push(command.clone());
    }
}

/// What the map shows once every issued command has been applied
#[derive(Debug, Default, Clone, PartialEq)]
struct Scene {
    user: Option<LngLat>,
    destination: Option<LngLat>,
    route: Option<Vec<LngLat>>,
    center: Option<LngLat>,
}

/// Sequences view-model changes onto a [`MapSurface`]
#[derive(Debug)]
pub struct MapRenderer<M: MapSurface> {
    surface: M,
    loaded: bool,
    /// Everything asked for so far, applied or not
    scene: Scene,
    initial_zoom: f64,
}

impl<M: MapSurface> MapRenderer<M> {
    pub fn new(surface: M, initial_zoom: f64) -> Self {
        Self {
            surface,
            loaded: false,
            scene: Scene::default(),
            initial_zoom,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Commands the load signal will apply. Empty once loaded.
    ///
    /// Only the net change from an empty map is kept, so a map that never
    /// loads costs one scene, not one command per update.
    pub fn pending(&self) -> Vec<MapCommand> {
        if self.loaded {
            return Vec::new();
        }
        scene_diff(&Scene::default(), &self.scene, self.initial_zoom)
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut M {
        &mut self.surface
    }

    /// The map finished loading. Whatever was rendered before is applied
    /// in one pass, exactly once; later calls do nothing. Returns how many
    /// commands were applied.
    pub fn on_load(&mut self) -> usize {
        if self.loaded {
            return 0;
        }
        self.loaded = true;

        let commands = scene_diff(&Scene::default(), &self.scene, self.initial_zoom);
        for command in &commands {
            self.surface.apply(command);
        }
        tracing::debug!("Map loaded, replayed {} commands", commands.len());
        commands.len()
    }

    /// Bring the map in line with `view`. Returns how many commands were
    /// applied; nothing is applied before the load signal.
    pub fn render(&mut self, view: &ViewModel) -> usize {
        let scene = Scene {
            user: view.user_marker,
            destination: view.destination_marker,
            route: view.route_line.clone(),
            center: view.camera.or(self.scene.center),
        };
        let previous = std::mem::replace(&mut self.scene, scene);
        if !self.loaded {
            return 0;
        }

        let commands = scene_diff(&previous, &self.scene, self.initial_zoom);
        for command in &commands {
            self.surface.apply(command);
        }
        commands.len()
    }
}

/// Commands that turn `old` into `new`. The first camera move carries the
/// initial zoom.
fn scene_diff(old: &Scene, new: &Scene, initial_zoom: f64) -> Vec<MapCommand> {
    let mut commands = Vec::new();

    marker_diff(&mut commands, MarkerRole::User, old.user, new.user);
    marker_diff(&mut commands, MarkerRole::Destination, old.destination, new.destination);

    match (&old.route, &new.route) {
        (None, Some(path)) => commands.push(MapCommand::AddLine { layer: ROUTE_LAYER_ID, path: path.clone() }),
        (Some(prev), Some(path)) if prev != path => {
            commands.push(MapCommand::UpdateLine { layer: ROUTE_LAYER_ID, path: path.clone() })
        }
        (Some(_), None) => commands.push(MapCommand::RemoveLine { layer: ROUTE_LAYER_ID }),
        _ => {}
    }

    if let Some(center) = new.center {
        if old.center != Some(center) {
            let zoom = old.center.is_none().then_some(initial_zoom);
            commands.push(MapCommand::SetCamera { center, zoom });
        }
    }

    commands
}

fn marker_diff(out: &mut Vec<MapCommand>, role: MarkerRole, old: Option<LngLat>, new: Option<LngLat>) {
    match (old, new) {
        (None, Some(at)) => out.push(MapCommand::AddMarker { role, at }),
        (Some(prev), Some(at)) if prev != at => out.push(MapCommand::MoveMarker { role, at }),
        (Some(_), None) => out.push(MapCommand::RemoveMarker { role }),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: LngLat = LngLat::new(-73.5, 45.5);
    const DEST: LngLat = LngLat::new(-73.6, 45.6);

    fn view(user: Option<LngLat>, dest: Option<LngLat>) -> ViewModel {
        ViewModel {
            user_marker: user,
            destination_marker: dest,
            camera: user.or(dest),
            ..Default::default()
        }
    }

    #[test]
    fn test_nothing_applied_until_load() {
        let mut renderer = MapRenderer::new(RecordingSurface::new(), 14.0);
        assert_eq!(renderer.render(&view(Some(USER), Some(DEST))), 0);
        assert!(renderer.surface().commands.is_empty());
        assert_eq!(renderer.pending().len(), 3);

        assert_eq!(renderer.on_load(), 3);
        assert_eq!(renderer.on_load(), 0);
        assert!(renderer.pending().is_empty());
        assert_eq!(
            renderer.surface().commands,
            vec![
                MapCommand::AddMarker { role: MarkerRole::User, at: USER },
                MapCommand::AddMarker { role: MarkerRole::Destination, at: DEST },
                MapCommand::SetCamera { center: USER, zoom: Some(14.0) },
            ]
        );
    }

    #[test]
    fn test_pending_stays_bounded_before_load() {
        let mut renderer = MapRenderer::new(RecordingSurface::new(), 14.0);
        for i in 0..1000 {
            let user = LngLat::new(-73.5 + i as f64 * 1e-5, 45.5);
            renderer.render(&view(Some(user), Some(DEST)));
        }
        assert_eq!(renderer.pending().len(), 3);

        let last = LngLat::new(-73.5 + 999.0 * 1e-5, 45.5);
        assert_eq!(renderer.on_load(), 3);
        assert_eq!(
            renderer.surface().commands[0],
            MapCommand::AddMarker { role: MarkerRole::User, at: last }
        );
    }

    #[test]
    fn test_unchanged_view_issues_nothing() {
        let mut renderer = MapRenderer::new(RecordingSurface::new(), 14.0);
        renderer.on_load();
        renderer.render(&view(Some(USER), Some(DEST)));
        assert_eq!(renderer.render(&view(Some(USER), Some(DEST))), 0);
    }

    #[test]
    fn test_marker_move_and_remove() {
        let mut renderer = MapRenderer::new(RecordingSurface::new(), 14.0);
        renderer.on_load();
        renderer.render(&view(Some(USER), Some(DEST)));
        renderer.surface_mut().take();

        let moved = LngLat::new(-73.55, 45.55);
        renderer.render(&view(Some(moved), None));
        assert_eq!(
            renderer.surface_mut().take(),
            vec![
                MapCommand::MoveMarker { role: MarkerRole::User, at: moved },
                MapCommand::RemoveMarker { role: MarkerRole::Destination },
                MapCommand::SetCamera { center: moved, zoom: None },
            ]
        );
    }

    #[test]
    fn test_route_line_lifecycle() {
        let mut renderer = MapRenderer::new(RecordingSurface::new(), 14.0);
        renderer.on_load();

        let mut v = ViewModel::default();
        v.route_line = Some(vec![USER, DEST]);
        renderer.render(&v);
        v.route_line = Some(vec![USER, LngLat::new(0.0, 0.0), DEST]);
        renderer.render(&v);
        v.route_line = None;
        renderer.render(&v);

        let layers: Vec<_> = renderer
            .surface()
            .commands
            .iter()
            .map(|c| match c {
                MapCommand::AddLine { layer, .. } => format!("add {layer}"),
                MapCommand::UpdateLine { layer, .. } => format!("update {layer}"),
                MapCommand::RemoveLine { layer } => format!("remove {layer}"),
                other => format!("{other:?}"),
            })
            .collect();
        assert_eq!(layers, vec!["add route", "update route", "remove route"]);
    }

    #[test]
    fn test_changes_undone_before_load_apply_nothing() {
        let mut renderer = MapRenderer::new(RecordingSurface::new(), 14.0);
        renderer.render(&view(Some(USER), None));
        renderer.render(&ViewModel::default());
        renderer.on_load();

        // The camera already moved once; only that survives
        assert_eq!(
            renderer.surface().commands,
            vec![MapCommand::SetCamera { center: USER, zoom: Some(14.0) }]
        );
    }
}
