use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, trace};

use crate::config::{CameraConfig, TerrainConfig};
use crate::error::EngineError;
use crate::geo::LngLat;
use crate::layer::symbol::Paint;
use crate::layer::FeatureCollection;
use crate::surface::{
    CameraOptions, ClickHandler, Cursor, EngineEvent, FeatureClick, LayerEvent, MapEngine,
    MapSurface, RenderLayerSpec, SourceSpec, TerrainSpec,
};

/// Id of the raster DEM source added in 3D mode.
pub const TERRAIN_SOURCE_ID: &str = "atlas-dem";
/// Id of the sky overlay added in 3D mode.
pub const SKY_LAYER_ID: &str = "atlas-sky";

/// [`MapSurface`] implementation driving a [`MapEngine`].
///
/// The surface records every source, render layer, click handler and the terrain state it was
/// asked for. Changes are forwarded to the engine right away when its style is loaded; otherwise
/// they wait in the ledger. When the engine reports [`EngineEvent::StyleLoaded`], the ledger is
/// applied again: sources, render layers in their original order, terrain, then handler
/// subscriptions. Anything the engine still holds is skipped, so re-application never duplicates.
pub struct Surface<E: MapEngine> {
    engine: E,
    style: String,
    sources: Vec<(String, SourceSpec)>,
    layers: Vec<RenderLayerSpec>,
    handlers: HashMap<String, ClickHandler, ahash::RandomState>,
    terrain_exaggeration: Option<f64>,
    terrain_config: TerrainConfig,
    camera_config: CameraConfig,
}

impl<E: MapEngine> Surface<E> {
    /// Creates a new surface and loads the initial style into the engine.
    pub fn new(mut engine: E, style: impl Into<String>) -> Self {
        let style = style.into();
        engine.set_style(&style);

        Self {
            engine,
            style,
            sources: Vec::new(),
            layers: Vec::new(),
            handlers: HashMap::default(),
            terrain_exaggeration: None,
            terrain_config: TerrainConfig::default(),
            camera_config: CameraConfig::default(),
        }
    }

    /// Sets terrain source and camera pitch settings used by [`MapSurface::set_terrain`].
    pub fn with_terrain_config(mut self, terrain_config: TerrainConfig) -> Self {
        self.terrain_config = terrain_config;
        self
    }

    /// Sets camera animation settings.
    pub fn with_camera_config(mut self, camera_config: CameraConfig) -> Self {
        self.camera_config = camera_config;
        self
    }

    /// Underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns true if terrain is enabled.
    pub fn is_terrain_enabled(&self) -> bool {
        self.terrain_exaggeration.is_some()
    }

    fn is_live(&self) -> bool {
        self.engine.is_style_loaded()
    }

    fn reapply(&mut self) {
        if !self.is_live() {
            return;
        }

        trace!(
            "Re-applying {} sources and {} render layers",
            self.sources.len(),
            self.layers.len()
        );

        for (id, spec) in &self.sources {
            if !self.engine.has_source(id) {
                let result = self.engine.add_source(id, spec.clone());
                absorb("add_source", result);
            }
        }

        for layer in &self.layers {
            if !self.engine.has_layer(&layer.id) {
                let result = self.engine.add_layer(layer);
                absorb("add_layer", result);
            }
        }

        if let Some(exaggeration) = self.terrain_exaggeration {
            self.apply_terrain(exaggeration);
        }

        let handler_layers: Vec<String> = self.handlers.keys().cloned().collect();
        for layer_id in handler_layers {
            self.subscribe(&layer_id);
        }
    }

    fn apply_terrain(&mut self, exaggeration: f64) {
        if !self.engine.has_source(TERRAIN_SOURCE_ID) {
            let dem = SourceSpec::RasterDem {
                url: self.terrain_config.dem_url.clone(),
                tile_size: self.terrain_config.tile_size,
                max_zoom: self.terrain_config.max_zoom,
            };
            let result = self.engine.add_source(TERRAIN_SOURCE_ID, dem);
            absorb("add_source", result);
        }

        let result = self.engine.set_terrain(Some(TerrainSpec {
            source: TERRAIN_SOURCE_ID.to_string(),
            exaggeration,
        }));
        absorb("set_terrain", result);

        if !self.engine.has_layer(SKY_LAYER_ID) {
            let sky = RenderLayerSpec::new(
                SKY_LAYER_ID,
                None,
                Paint::Sky {
                    sun_intensity: self.terrain_config.sky_sun_intensity,
                },
            );
            let result = self.engine.add_layer(&sky);
            absorb("add_layer", result);
        }
    }

    fn clear_terrain(&mut self) {
        let result = self.engine.set_terrain(None);
        absorb("set_terrain", result);

        if self.engine.has_layer(SKY_LAYER_ID) {
            let result = self.engine.remove_layer(SKY_LAYER_ID);
            absorb("remove_layer", result);
        }
        if self.engine.has_source(TERRAIN_SOURCE_ID) {
            let result = self.engine.remove_source(TERRAIN_SOURCE_ID);
            absorb("remove_source", result);
        }
    }

    fn ease_pitch(&mut self, pitch: f64) {
        self.engine.ease_to(CameraOptions {
            pitch: Some(pitch),
            bearing: Some(0.0),
            duration: self.terrain_config.transition(),
            ..Default::default()
        });
    }

    fn subscribe(&mut self, layer_id: &str) {
        for event in LayerEvent::ALL {
            let result = self.engine.subscribe(layer_id, event);
            absorb("subscribe", result);
        }
    }
}

fn absorb(operation: &str, result: Result<(), EngineError>) {
    if let Err(err) = result {
        debug!("Engine rejected {operation}: {err}");
    }
}

impl<E: MapEngine> MapSurface for Surface<E> {
    fn set_style(&mut self, style: &str) {
        if self.style == style {
            trace!("Style {style} is already set");
            return;
        }

        info!("Switching map style to {style}");
        self.style = style.to_string();
        self.engine.set_style(style);

        // Engines that load synchronously never emit a separate load event.
        self.reapply();
    }

    fn style(&self) -> &str {
        &self.style
    }

    fn set_terrain(&mut self, enabled: bool, exaggeration: f64) {
        match (enabled, self.terrain_exaggeration) {
            (true, Some(current)) if current == exaggeration => {
                trace!("Terrain is already enabled");
            }
            (true, current) => {
                self.terrain_exaggeration = Some(exaggeration);
                if self.is_live() {
                    self.apply_terrain(exaggeration);
                }
                if current.is_none() {
                    info!("Terrain enabled with exaggeration {exaggeration}");
                    self.ease_pitch(self.terrain_config.pitch);
                }
            }
            (false, Some(_)) => {
                self.terrain_exaggeration = None;
                if self.is_live() {
                    self.clear_terrain();
                }
                info!("Terrain disabled");
                self.ease_pitch(0.0);
            }
            (false, None) => {
                trace!("Terrain is already disabled");
            }
        }
    }

    fn upsert_source(&mut self, source_id: &str, data: Arc<FeatureCollection>) {
        match self.sources.iter_mut().find(|(id, _)| id == source_id) {
            Some((_, spec)) => *spec = SourceSpec::GeoJson(data.clone()),
            None => self
                .sources
                .push((source_id.to_string(), SourceSpec::GeoJson(data.clone()))),
        }

        if !self.is_live() {
            trace!("Source {source_id} deferred until style is loaded");
            return;
        }

        let result = if self.engine.has_source(source_id) {
            trace!("Replacing data of source {source_id}");
            self.engine.set_source_data(source_id, data)
        } else {
            trace!("Adding source {source_id}");
            self.engine.add_source(source_id, SourceSpec::GeoJson(data))
        };
        absorb("upsert_source", result);
    }

    fn add_render_layer(&mut self, render_layer_id: &str, source_id: &str, paint: Paint) {
        if self.has_render_layer(render_layer_id) {
            debug!("Render layer {render_layer_id} already exists");
            return;
        }

        let layer = RenderLayerSpec::new(render_layer_id, Some(source_id.to_string()), paint);
        if self.is_live() && !self.engine.has_layer(render_layer_id) {
            trace!("Adding render layer {render_layer_id}");
            let result = self.engine.add_layer(&layer);
            absorb("add_layer", result);
        }

        self.layers.push(layer);
    }

    fn remove_render_layer(&mut self, render_layer_id: &str) {
        self.layers.retain(|layer| layer.id != render_layer_id);

        if self.is_live() && self.engine.has_layer(render_layer_id) {
            trace!("Removing render layer {render_layer_id}");
            let result = self.engine.remove_layer(render_layer_id);
            absorb("remove_layer", result);
        }
    }

    fn remove_source(&mut self, source_id: &str) {
        let user = self
            .layers
            .iter()
            .find(|layer| layer.source.as_deref() == Some(source_id));
        if let Some(layer) = user {
            debug!("Source {source_id} is kept, render layer {} still uses it", layer.id);
            return;
        }

        self.sources.retain(|(id, _)| id != source_id);

        if self.is_live() && self.engine.has_source(source_id) {
            trace!("Removing source {source_id}");
            let result = self.engine.remove_source(source_id);
            absorb("remove_source", result);
        }
    }

    fn set_layer_visibility(&mut self, render_layer_id: &str, visible: bool) {
        let Some(layer) = self.layers.iter_mut().find(|l| l.id == render_layer_id) else {
            debug!("Cannot change visibility of missing render layer {render_layer_id}");
            return;
        };
        layer.visible = visible;

        if self.is_live() && self.engine.has_layer(render_layer_id) {
            let result = self.engine.set_layer_visibility(render_layer_id, visible);
            absorb("set_layer_visibility", result);
        }
    }

    fn register_click_handler(&mut self, render_layer_id: &str, handler: ClickHandler) {
        if !self.has_render_layer(render_layer_id) {
            debug!("Cannot attach click handler to missing render layer {render_layer_id}");
            return;
        }

        let is_new = self
            .handlers
            .insert(render_layer_id.to_string(), handler)
            .is_none();
        if is_new && self.is_live() {
            self.subscribe(render_layer_id);
        }
    }

    fn unregister_click_handler(&mut self, render_layer_id: &str) {
        if self.handlers.remove(render_layer_id).is_none() {
            return;
        }

        for event in LayerEvent::ALL {
            self.engine.unsubscribe(render_layer_id, event);
        }
        self.engine.set_cursor(Cursor::Default);
    }

    fn fly_to(&mut self, center: LngLat, zoom: f64) {
        self.engine.fly_to(CameraOptions {
            center: Some(center),
            zoom: Some(zoom),
            duration: self.camera_config.fly_to_duration(),
            ..Default::default()
        });
    }

    fn show_popup(&mut self, position: LngLat, html: &str) {
        self.engine.show_popup(position, html);
    }

    fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::StyleLoaded => {
                info!("Style {} loaded", self.style);
                self.reapply();
            }
            EngineEvent::Click {
                layer_id,
                feature,
                position,
            } => {
                let Some(handler) = self.handlers.get(&layer_id).cloned() else {
                    return;
                };

                let click = FeatureClick {
                    render_layer_id: layer_id,
                    feature,
                    position,
                };
                if let Some(popup) = handler(&click) {
                    self.engine.show_popup(popup.position, &popup.html);
                }
            }
            EngineEvent::MouseEnter { layer_id } => {
                if self.handlers.contains_key(&layer_id) {
                    self.engine.set_cursor(Cursor::Pointer);
                }
            }
            EngineEvent::MouseLeave { layer_id } => {
                if self.handlers.contains_key(&layer_id) {
                    self.engine.set_cursor(Cursor::Default);
                }
            }
        }
    }

    fn has_source(&self, source_id: &str) -> bool {
        self.sources.iter().any(|(id, _)| id == source_id)
    }

    fn has_render_layer(&self, render_layer_id: &str) -> bool {
        self.layers.iter().any(|layer| layer.id == render_layer_id)
    }

    fn has_click_handler(&self, render_layer_id: &str) -> bool {
        self.handlers.contains_key(render_layer_id)
    }

    fn render_layer_ids(&self) -> Vec<String> {
        self.layers.iter().map(|layer| layer.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use serde_json::json;

    use super::*;
    use crate::layer::popup::Popup;
    use crate::surface::MemoryEngine;
    use crate::tests::{feature, point_collection};
    use crate::Color;

    const LIGHT: &str = "mapbox://styles/mapbox/streets-v12";
    const DARK: &str = "mapbox://styles/mapbox/dark-v11";

    fn circle() -> Paint {
        Paint::Circle {
            color: Color::BLUE,
            radius: 8.0,
            stroke_color: Color::WHITE,
            stroke_width: 2.0,
        }
    }

    fn surface() -> (Surface<MemoryEngine>, MemoryEngine) {
        let engine = MemoryEngine::new();
        let mut surface = Surface::new(engine.clone(), LIGHT);
        engine.finish_style_load();
        surface.handle_event(EngineEvent::StyleLoaded);

        (surface, engine)
    }

    fn popup_handler(html: &'static str) -> ClickHandler {
        Arc::new(move |click: &FeatureClick| {
            Some(Popup {
                position: click.position,
                html: html.to_string(),
            })
        })
    }

    #[test]
    fn upsert_replaces_data_in_place() {
        let (mut surface, engine) = surface();
        surface.upsert_source("s", Arc::new(point_collection(&[[1.0, 1.0]])));
        surface.upsert_source("s", Arc::new(point_collection(&[[1.0, 1.0], [2.0, 2.0]])));

        assert_eq!(engine.source_add_count("s"), 1);
        assert_eq!(engine.source_data("s").unwrap().features.len(), 2);
    }

    #[test]
    fn duplicate_and_missing_operations_are_noops() {
        let (mut surface, engine) = surface();
        surface.upsert_source("s", Arc::new(point_collection(&[[1.0, 1.0]])));
        surface.add_render_layer("l", "s", circle());
        surface.add_render_layer("l", "s", circle());

        assert_eq!(engine.layer_ids(), vec!["l".to_string()]);

        surface.remove_render_layer("missing");
        surface.remove_source("missing");
        surface.unregister_click_handler("missing");
        surface.set_layer_visibility("missing", false);
        surface.register_click_handler("missing", popup_handler("x"));

        assert!(!surface.has_click_handler("missing"));
        assert_eq!(engine.subscription_count(), 0);
    }

    #[test]
    fn source_in_use_is_kept() {
        let (mut surface, engine) = surface();
        surface.upsert_source("s", Arc::new(point_collection(&[[1.0, 1.0]])));
        surface.add_render_layer("l", "s", circle());

        surface.remove_source("s");

        assert!(surface.has_source("s"));
        assert_eq!(engine.source_ids(), vec!["s"]);
        assert_eq!(engine.layer_ids(), vec!["l"]);

        surface.remove_render_layer("l");
        surface.remove_source("s");

        assert!(!surface.has_source("s"));
        assert!(engine.source_ids().is_empty());
    }

    #[test]
    fn click_shows_handler_popup() {
        let (mut surface, engine) = surface();
        surface.upsert_source("s", Arc::new(point_collection(&[[1.0, 1.0]])));
        surface.add_render_layer("l", "s", circle());
        surface.register_click_handler("l", popup_handler("<b>hi</b>"));

        surface.handle_event(EngineEvent::MouseEnter {
            layer_id: "l".into(),
        });
        assert_eq!(engine.cursor(), Cursor::Pointer);

        surface.handle_event(EngineEvent::Click {
            layer_id: "l".into(),
            feature: feature(geojson::Value::Point(vec![1.0, 1.0]), json!({})),
            position: LngLat::new(1.0, 1.0),
        });
        assert_eq!(engine.popups().len(), 1);
        assert_eq!(engine.popups()[0].html, "<b>hi</b>");

        surface.unregister_click_handler("l");
        assert_eq!(engine.cursor(), Cursor::Default);
        assert_eq!(engine.subscription_count(), 0);

        surface.handle_event(EngineEvent::Click {
            layer_id: "l".into(),
            feature: feature(geojson::Value::Point(vec![1.0, 1.0]), json!({})),
            position: LngLat::new(1.0, 1.0),
        });
        assert_eq!(engine.popups().len(), 1);
    }

    #[test]
    fn style_swap_reapplies_ledger_once_loaded() {
        let (mut surface, engine) = surface();
        surface.upsert_source("s", Arc::new(point_collection(&[[1.0, 1.0]])));
        surface.add_render_layer("l-fill", "s", circle());
        surface.add_render_layer("l-outline", "s", circle());
        surface.set_layer_visibility("l-outline", false);
        surface.register_click_handler("l-fill", popup_handler("x"));

        surface.set_style(DARK);
        assert!(engine.layer_ids().is_empty());
        assert!(!engine.is_style_loaded());

        // Changes while loading wait in the ledger.
        surface.upsert_source("t", Arc::new(point_collection(&[[2.0, 2.0]])));
        surface.add_render_layer("m", "t", circle());
        assert!(engine.source_ids().is_empty());

        engine.finish_style_load();
        surface.handle_event(EngineEvent::StyleLoaded);
        surface.handle_event(EngineEvent::StyleLoaded);

        assert_eq!(engine.style().as_deref(), Some(DARK));
        assert_eq!(
            engine.layer_ids(),
            vec!["l-fill".to_string(), "l-outline".to_string(), "m".to_string()]
        );
        assert_eq!(engine.source_ids(), vec!["s".to_string(), "t".to_string()]);
        assert!(!engine.layer("l-outline").unwrap().visible);
        assert!(engine.has_subscription("l-fill", LayerEvent::Click));
        assert_eq!(engine.subscription_count(), 3);
    }

    #[test]
    fn setting_same_style_is_noop() {
        let (mut surface, engine) = surface();
        surface.upsert_source("s", Arc::new(point_collection(&[[1.0, 1.0]])));
        surface.set_style(LIGHT);

        assert!(engine.is_style_loaded());
        assert_eq!(engine.source_ids(), vec!["s".to_string()]);
    }

    #[test]
    fn terrain_toggle_is_idempotent() {
        let (mut surface, engine) = surface();

        surface.set_terrain(true, 1.5);
        surface.set_terrain(true, 1.5);

        assert_eq!(engine.source_add_count(TERRAIN_SOURCE_ID), 1);
        assert_eq!(engine.layer_ids(), vec![SKY_LAYER_ID.to_string()]);
        assert_relative_eq!(engine.terrain().unwrap().exaggeration, 1.5);
        assert_relative_eq!(engine.camera().pitch, 60.0);
        assert!(surface.render_layer_ids().is_empty());

        surface.set_terrain(false, 1.5);
        surface.set_terrain(false, 1.5);

        assert!(engine.terrain().is_none());
        assert!(engine.layer_ids().is_empty());
        assert!(engine.source_ids().is_empty());
        assert_relative_eq!(engine.camera().pitch, 0.0);
    }

    #[test]
    fn terrain_survives_style_swap() {
        let (mut surface, engine) = surface();
        surface.upsert_source("s", Arc::new(point_collection(&[[1.0, 1.0]])));
        surface.add_render_layer("l", "s", circle());
        surface.set_terrain(true, 2.0);

        surface.set_style(DARK);
        engine.finish_style_load();
        surface.handle_event(EngineEvent::StyleLoaded);

        assert_eq!(
            engine.layer_ids(),
            vec!["l".to_string(), SKY_LAYER_ID.to_string()]
        );
        assert_relative_eq!(engine.terrain().unwrap().exaggeration, 2.0);
    }

    #[test]
    fn fly_to_uses_camera_config() {
        let (surface, engine) = surface();
        let mut surface = surface.with_camera_config(CameraConfig {
            fly_to_zoom: 14.0,
            fly_to_ms: 500,
        });

        surface.fly_to(LngLat::new(105.8, 21.0), 12.0);

        let camera = engine.camera();
        assert_eq!(camera.center, LngLat::new(105.8, 21.0));
        assert_relative_eq!(camera.zoom, 12.0);
        assert_eq!(camera.last_duration, std::time::Duration::from_millis(500));
    }
}
