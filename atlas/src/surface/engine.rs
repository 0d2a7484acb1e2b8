use std::sync::Arc;
use std::time::Duration;

use geojson::Feature;
use serde_json::json;

use crate::error::EngineError;
use crate::geo::LngLat;
use crate::layer::symbol::Paint;
use crate::layer::FeatureCollection;

/// Data container of the map engine that render layers draw from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    /// Source bound to a feature collection.
    GeoJson(Arc<FeatureCollection>),
    /// Elevation tiles used by 3D terrain.
    RasterDem {
        /// Tileset url.
        url: String,
        /// Size of a tile in pixels.
        tile_size: u32,
        /// Maximum zoom level tiles are available at.
        max_zoom: u8,
    },
}

/// One styled drawing pass registered with the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderLayerSpec {
    /// Render layer id.
    pub id: String,
    /// Source the layer draws from. Overlays such as the sky have no source.
    pub source: Option<String>,
    /// Paint properties.
    pub paint: Paint,
    /// Layout visibility.
    pub visible: bool,
}

impl RenderLayerSpec {
    /// Creates a visible render layer.
    pub fn new(id: impl Into<String>, source: Option<String>, paint: Paint) -> Self {
        Self {
            id: id.into(),
            source,
            paint,
            visible: true,
        }
    }

    /// The layer as an entry of a style document `layers` array.
    pub fn to_style_layer(&self) -> serde_json::Value {
        let mut layer = json!({
            "id": self.id,
            "type": self.paint.layer_type(),
            "paint": self.paint.to_style_json(),
            "layout": { "visibility": if self.visible { "visible" } else { "none" } },
        });
        if let Some(source) = &self.source {
            layer["source"] = json!(source);
        }

        layer
    }
}

/// Terrain elevation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSpec {
    /// Raster DEM source providing elevation.
    pub source: String,
    /// Vertical exaggeration of elevation.
    pub exaggeration: f64,
}

/// Camera animation target. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraOptions {
    /// Map center.
    pub center: Option<LngLat>,
    /// Zoom level.
    pub zoom: Option<f64>,
    /// Pitch in degrees, 0 is looking straight down.
    pub pitch: Option<f64>,
    /// Bearing in degrees.
    pub bearing: Option<f64>,
    /// Animation duration.
    pub duration: Duration,
}

/// Mouse cursor over the map canvas.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// Default cursor.
    #[default]
    Default,
    /// Pointer shown over clickable features.
    Pointer,
}

/// Per-render-layer event kinds an engine can be subscribed to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerEvent {
    /// Feature click.
    Click,
    /// Cursor entered a feature.
    MouseEnter,
    /// Cursor left a feature.
    MouseLeave,
}

impl LayerEvent {
    /// All event kinds a click handler subscribes to.
    pub const ALL: [LayerEvent; 3] = [
        LayerEvent::Click,
        LayerEvent::MouseEnter,
        LayerEvent::MouseLeave,
    ];
}

/// Event emitted by the map engine, fed to [`MapSurface::handle_event`](super::MapSurface::handle_event)
/// by the embedding application.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Style document finished loading. All style-bound resources are gone at this point.
    StyleLoaded,
    /// A feature of a subscribed render layer was clicked.
    Click {
        /// Render layer the feature belongs to.
        layer_id: String,
        /// Clicked feature.
        feature: Feature,
        /// Clicked map position.
        position: LngLat,
    },
    /// Cursor entered a feature of a subscribed render layer.
    MouseEnter {
        /// Render layer id.
        layer_id: String,
    },
    /// Cursor left a feature of a subscribed render layer.
    MouseLeave {
        /// Render layer id.
        layer_id: String,
    },
}

/// Raw interface of a map rendering engine.
///
/// Operations fail with [`EngineError`] like the underlying engine would throw: adding an
/// existing id, removing a missing one, or mutating the style while it is loading. Only the
/// [`Surface`](super::Surface) facade calls these.
pub trait MapEngine: Send {
    /// Starts loading a new style document. Sources, render layers, terrain and subscriptions of the
    /// previous style are discarded.
    fn set_style(&mut self, style: &str);
    /// Returns true when the current style has loaded and accepts changes.
    fn is_style_loaded(&self) -> bool;

    /// Returns true if the source exists.
    fn has_source(&self, source_id: &str) -> bool;
    /// Adds a source.
    fn add_source(&mut self, source_id: &str, source: SourceSpec) -> Result<(), EngineError>;
    /// Replaces the data of an existing GeoJSON source.
    fn set_source_data(
        &mut self,
        source_id: &str,
        data: Arc<FeatureCollection>,
    ) -> Result<(), EngineError>;
    /// Removes a source. Fails if a render layer still uses it.
    fn remove_source(&mut self, source_id: &str) -> Result<(), EngineError>;

    /// Returns true if the render layer exists.
    fn has_layer(&self, layer_id: &str) -> bool;
    /// Adds a render layer on top of existing ones.
    fn add_layer(&mut self, layer: &RenderLayerSpec) -> Result<(), EngineError>;
    /// Removes a render layer.
    fn remove_layer(&mut self, layer_id: &str) -> Result<(), EngineError>;
    /// Sets layout visibility of a render layer.
    fn set_layer_visibility(&mut self, layer_id: &str, visible: bool) -> Result<(), EngineError>;

    /// Enables terrain, or disables it with `None`.
    fn set_terrain(&mut self, terrain: Option<TerrainSpec>) -> Result<(), EngineError>;

    /// Starts emitting events of the given kind for the render layer.
    fn subscribe(&mut self, layer_id: &str, event: LayerEvent) -> Result<(), EngineError>;
    /// Stops emitting events of the given kind for the render layer.
    fn unsubscribe(&mut self, layer_id: &str, event: LayerEvent);
    /// Sets the canvas cursor.
    fn set_cursor(&mut self, cursor: Cursor);

    /// Animates the camera without travel arc.
    fn ease_to(&mut self, camera: CameraOptions);
    /// Animates the camera along a flight path.
    fn fly_to(&mut self, camera: CameraOptions);
    /// Opens a popup at the position.
    fn show_popup(&mut self, position: LngLat, html: &str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    #[test]
    fn style_layer_json() {
        let mut layer = RenderLayerSpec::new(
            "layer-3-fill",
            Some("layer-3-source".into()),
            Paint::Fill {
                color: Color::BLUE,
                opacity: 0.3,
            },
        );
        layer.visible = false;

        let json = layer.to_style_layer();
        assert_eq!(json["type"], "fill");
        assert_eq!(json["source"], "layer-3-source");
        assert_eq!(json["layout"]["visibility"], "none");
        assert_eq!(json["paint"]["fill-opacity"], 0.3);
    }

    #[test]
    fn sky_layer_has_no_source() {
        let sky = RenderLayerSpec::new("atlas-sky", None, Paint::Sky { sun_intensity: 15.0 });
        assert!(sky.to_style_layer().get("source").is_none());
    }
}
