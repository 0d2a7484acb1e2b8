//! The map surface is the only way this crate touches the map rendering engine.
//!
//! [`MapSurface`] is an imperative interface where adding something that exists or removing
//! something that is gone is a no-op, never an error. The engine can drop resources on its own
//! (a style swap clears everything). [`Surface`] implements it on top of any [`MapEngine`] and
//! keeps a ledger of what it added, so it can put everything back after a style reload.

use std::sync::Arc;

use geojson::Feature;
use parking_lot::Mutex;

use crate::geo::LngLat;
use crate::layer::popup::Popup;
use crate::layer::symbol::Paint;
use crate::layer::FeatureCollection;

mod engine;
mod facade;
mod memory;

pub use engine::{
    CameraOptions, Cursor, EngineEvent, LayerEvent, MapEngine, RenderLayerSpec, SourceSpec,
    TerrainSpec,
};
pub use facade::{Surface, SKY_LAYER_ID, TERRAIN_SOURCE_ID};
pub use memory::{CameraState, MemoryEngine};

/// Map surface shared between the components that drive it.
pub type SharedSurface = Arc<Mutex<dyn MapSurface>>;

/// Callback invoked when a feature of a render layer is clicked. The returned popup, if any, is
/// shown at its position.
pub type ClickHandler = Arc<dyn Fn(&FeatureClick) -> Option<Popup> + Send + Sync>;

/// Click on a feature of a render layer.
#[derive(Debug, Clone)]
pub struct FeatureClick {
    /// Render layer that received the click.
    pub render_layer_id: String,
    /// Clicked feature.
    pub feature: Feature,
    /// Clicked map position.
    pub position: LngLat,
}

/// Stable interface of the live map.
pub trait MapSurface: Send {
    /// Swaps the base map style. Managed sources and render layers survive the swap.
    fn set_style(&mut self, style: &str);
    /// Current style.
    fn style(&self) -> &str;
    /// Adds or removes terrain elevation with a sky overlay and tilts the camera accordingly.
    fn set_terrain(&mut self, enabled: bool, exaggeration: f64);

    /// Creates the source, or replaces its data in place if it exists.
    fn upsert_source(&mut self, source_id: &str, data: Arc<FeatureCollection>);
    /// Adds a render layer drawing from the source. No-op if the id exists.
    fn add_render_layer(&mut self, render_layer_id: &str, source_id: &str, paint: Paint);
    /// Removes a render layer. No-op if absent.
    fn remove_render_layer(&mut self, render_layer_id: &str);
    /// Removes a source. No-op if absent.
    fn remove_source(&mut self, source_id: &str);
    /// Shows or hides a render layer. No-op if absent.
    fn set_layer_visibility(&mut self, render_layer_id: &str, visible: bool);

    /// Attaches click and hover behavior to a render layer. No-op if the layer does not exist.
    fn register_click_handler(&mut self, render_layer_id: &str, handler: ClickHandler);
    /// Detaches click and hover behavior. No-op if none is attached.
    fn unregister_click_handler(&mut self, render_layer_id: &str);

    /// Flies the camera to the position.
    fn fly_to(&mut self, center: LngLat, zoom: f64);
    /// Opens a popup.
    fn show_popup(&mut self, position: LngLat, html: &str);

    /// Processes an engine event.
    fn handle_event(&mut self, event: EngineEvent);

    /// Returns true if the surface manages the source.
    fn has_source(&self, source_id: &str) -> bool;
    /// Returns true if the surface manages the render layer.
    fn has_render_layer(&self, render_layer_id: &str) -> bool;
    /// Returns true if a click handler is attached to the render layer.
    fn has_click_handler(&self, render_layer_id: &str) -> bool;
    /// Managed render layers, bottom to top.
    fn render_layer_ids(&self) -> Vec<String>;
}
