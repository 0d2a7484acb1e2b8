//! Global render modes of the map: 3D terrain and dark base map.

use std::sync::Arc;

use log::info;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::StyleConfig;
use crate::messenger::Messenger;
use crate::surface::SharedSurface;

/// Render modes of the map. Independent of which layers are enabled.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderMode {
    /// Terrain elevation with a tilted camera.
    pub is_3d: bool,
    /// Dark base map style.
    pub is_dark: bool,
}

/// Owns the [`RenderMode`] and applies it to the map surface.
///
/// Never touches layer state: a style swap is handled by the surface itself, which puts the layer
/// resources back once the new style is loaded.
pub struct ModeController {
    mode: Mutex<RenderMode>,
    surface: SharedSurface,
    styles: StyleConfig,
    exaggeration: f64,
    messenger: Arc<dyn Messenger>,
}

impl ModeController {
    /// Creates a controller in flat light mode.
    pub fn new(
        surface: SharedSurface,
        styles: StyleConfig,
        exaggeration: f64,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            mode: Mutex::new(RenderMode::default()),
            surface,
            styles,
            exaggeration,
            messenger,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> RenderMode {
        *self.mode.lock()
    }

    /// Switches 3D terrain on or off. Returns the new mode.
    pub fn toggle_3d(&self) -> RenderMode {
        let new_mode = {
            let mut mode = self.mode.lock();
            mode.is_3d = !mode.is_3d;
            self.surface
                .lock()
                .set_terrain(mode.is_3d, self.exaggeration);
            *mode
        };

        info!("3D mode {}", if new_mode.is_3d { "on" } else { "off" });
        self.messenger.render_mode_changed(new_mode);
        new_mode
    }

    /// Switches between light and dark base map. Returns the new mode.
    pub fn toggle_dark_mode(&self) -> RenderMode {
        let new_mode = {
            let mut mode = self.mode.lock();
            mode.is_dark = !mode.is_dark;
            self.surface
                .lock()
                .set_style(self.styles.for_mode(mode.is_dark));
            *mode
        };

        info!("Dark mode {}", if new_mode.is_dark { "on" } else { "off" });
        self.messenger.render_mode_changed(new_mode);
        new_mode
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::surface::{EngineEvent, MemoryEngine, Surface, SKY_LAYER_ID, TERRAIN_SOURCE_ID};
    use crate::tests::RecordingMessenger;

    fn controller(messenger: Arc<dyn Messenger>) -> (ModeController, MemoryEngine, SharedSurface) {
        let engine = MemoryEngine::synchronous();
        let styles = StyleConfig::default();
        let surface: SharedSurface =
            Arc::new(Mutex::new(Surface::new(engine.clone(), styles.light.clone())));
        let controller = ModeController::new(surface.clone(), styles, 1.5, messenger);

        (controller, engine, surface)
    }

    #[test]
    fn toggle_3d_adds_and_removes_terrain() {
        let (controller, engine, _) = controller(Arc::new(RecordingMessenger::default()));

        let mode = controller.toggle_3d();
        assert!(mode.is_3d);
        assert!(!mode.is_dark);
        assert_eq!(engine.source_ids(), vec![TERRAIN_SOURCE_ID]);
        assert_eq!(engine.layer_ids(), vec![SKY_LAYER_ID]);
        assert_relative_eq!(engine.terrain().unwrap().exaggeration, 1.5);
        assert_relative_eq!(engine.camera().pitch, 60.0);

        let mode = controller.toggle_3d();
        assert!(!mode.is_3d);
        assert!(engine.terrain().is_none());
        assert!(engine.layer_ids().is_empty());
        assert_relative_eq!(engine.camera().pitch, 0.0);
    }

    #[test]
    fn toggle_dark_mode_swaps_style() {
        let messenger = Arc::new(RecordingMessenger::default());
        let (controller, engine, surface) = controller(messenger.clone());

        controller.toggle_dark_mode();
        assert_eq!(engine.style().as_deref(), Some("mapbox://styles/mapbox/dark-v11"));
        assert_eq!(surface.lock().style(), "mapbox://styles/mapbox/dark-v11");

        controller.toggle_dark_mode();
        assert_eq!(
            engine.style().as_deref(),
            Some("mapbox://styles/mapbox/streets-v12")
        );
        assert_eq!(messenger.mode_events().len(), 2);
        assert_eq!(controller.mode(), RenderMode::default());
    }

    #[test]
    fn modes_are_independent() {
        let (controller, engine, surface) = controller(Arc::new(RecordingMessenger::default()));

        controller.toggle_3d();
        let mode = controller.toggle_dark_mode();
        surface.lock().handle_event(EngineEvent::StyleLoaded);

        assert_eq!(
            mode,
            RenderMode {
                is_3d: true,
                is_dark: true
            }
        );
        assert_eq!(engine.layer_ids(), vec![SKY_LAYER_ID]);
        assert!(engine.terrain().is_some());
    }
}
