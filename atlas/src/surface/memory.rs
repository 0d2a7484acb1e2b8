use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::EngineError;
use crate::geo::LngLat;
use crate::layer::popup::Popup;
use crate::layer::FeatureCollection;
use crate::surface::{
    CameraOptions, Cursor, LayerEvent, MapEngine, RenderLayerSpec, SourceSpec, TerrainSpec,
};

/// Camera position of a [`MemoryEngine`] after all animations finished.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    /// Map center.
    pub center: LngLat,
    /// Zoom level.
    pub zoom: f64,
    /// Pitch in degrees.
    pub pitch: f64,
    /// Bearing in degrees.
    pub bearing: f64,
    /// Duration of the last animation.
    pub last_duration: Duration,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            center: LngLat::new(105.8342, 21.0278),
            zoom: 12.0,
            pitch: 0.0,
            bearing: 0.0,
            last_duration: Duration::ZERO,
        }
    }
}

#[derive(Default)]
struct EngineState {
    style: Option<String>,
    style_loaded: bool,
    loads_synchronously: bool,
    sources: Vec<(String, SourceSpec)>,
    source_adds: HashMap<String, usize>,
    layers: Vec<RenderLayerSpec>,
    terrain: Option<TerrainSpec>,
    subscriptions: HashSet<(String, LayerEvent)>,
    cursor: Cursor,
    camera: CameraState,
    popups: Vec<Popup>,
}

impl EngineState {
    fn ensure_loaded(&self) -> Result<(), EngineError> {
        if self.style_loaded {
            Ok(())
        } else {
            Err(EngineError::StyleNotLoaded)
        }
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.iter().any(|(source_id, _)| source_id == id)
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|layer| layer.id == id)
    }

    fn apply_camera(&mut self, camera: CameraOptions) {
        if let Some(center) = camera.center {
            self.camera.center = center;
        }
        if let Some(zoom) = camera.zoom {
            self.camera.zoom = zoom;
        }
        if let Some(pitch) = camera.pitch {
            self.camera.pitch = pitch;
        }
        if let Some(bearing) = camera.bearing {
            self.camera.bearing = bearing;
        }
        self.camera.last_duration = camera.duration;
    }
}

/// Map engine that keeps everything in memory and draws nothing.
///
/// It keeps the same bookkeeping a GL map engine does and rejects the same invalid operations.
/// Clones share state, so a clone kept outside of the [`Surface`](super::Surface) shows what is
/// on the map.
///
/// By default, a style swap leaves the engine in loading state until
/// [`finish_style_load`](MemoryEngine::finish_style_load) is called, as a real engine does
/// while it downloads the style document.
#[derive(Clone, Default)]
pub struct MemoryEngine {
    state: Arc<Mutex<EngineState>>,
}

impl MemoryEngine {
    /// Creates an engine that loads styles asynchronously.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine that finishes loading a style as soon as it is set.
    pub fn synchronous() -> Self {
        let engine = Self::default();
        engine.state.lock().loads_synchronously = true;
        engine
    }

    /// Completes loading of the current style.
    pub fn finish_style_load(&self) {
        let mut state = self.state.lock();
        if state.style.is_some() {
            state.style_loaded = true;
        }
    }

    /// Current style.
    pub fn style(&self) -> Option<String> {
        self.state.lock().style.clone()
    }

    /// Ids of all sources in insertion order.
    pub fn source_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .sources
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Data of a GeoJSON source.
    pub fn source_data(&self, source_id: &str) -> Option<Arc<FeatureCollection>> {
        self.state
            .lock()
            .sources
            .iter()
            .find_map(|(id, spec)| match spec {
                SourceSpec::GeoJson(data) if id == source_id => Some(data.clone()),
                _ => None,
            })
    }

    /// Number of times a source with the id was added since the engine was created.
    pub fn source_add_count(&self, source_id: &str) -> usize {
        self.state
            .lock()
            .source_adds
            .get(source_id)
            .copied()
            .unwrap_or(0)
    }

    /// Ids of all render layers, bottom to top.
    pub fn layer_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .layers
            .iter()
            .map(|layer| layer.id.clone())
            .collect()
    }

    /// Render layer with the id.
    pub fn layer(&self, layer_id: &str) -> Option<RenderLayerSpec> {
        self.state
            .lock()
            .layers
            .iter()
            .find(|layer| layer.id == layer_id)
            .cloned()
    }

    /// Current terrain.
    pub fn terrain(&self) -> Option<TerrainSpec> {
        self.state.lock().terrain.clone()
    }

    /// Returns true if events of the kind are emitted for the render layer.
    pub fn has_subscription(&self, layer_id: &str, event: LayerEvent) -> bool {
        self.state
            .lock()
            .subscriptions
            .contains(&(layer_id.to_string(), event))
    }

    /// Total number of event subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    /// Current cursor.
    pub fn cursor(&self) -> Cursor {
        self.state.lock().cursor
    }

    /// Camera position.
    pub fn camera(&self) -> CameraState {
        self.state.lock().camera.clone()
    }

    /// All popups opened so far.
    pub fn popups(&self) -> Vec<Popup> {
        self.state.lock().popups.clone()
    }

    /// Ids of all sources and render layers whose id contains the fragment.
    pub fn resources_matching(&self, fragment: &str) -> Vec<String> {
        let state = self.state.lock();
        state
            .sources
            .iter()
            .map(|(id, _)| id)
            .chain(state.layers.iter().map(|layer| &layer.id))
            .chain(state.subscriptions.iter().map(|(id, _)| id))
            .filter(|id| id.contains(fragment))
            .cloned()
            .collect()
    }
}

impl MapEngine for MemoryEngine {
    fn set_style(&mut self, style: &str) {
        let mut state = self.state.lock();
        state.style = Some(style.to_string());
        state.style_loaded = state.loads_synchronously;
        state.sources.clear();
        state.layers.clear();
        state.terrain = None;
        state.subscriptions.clear();
    }

    fn is_style_loaded(&self) -> bool {
        self.state.lock().style_loaded
    }

    fn has_source(&self, source_id: &str) -> bool {
        self.state.lock().has_source(source_id)
    }

    fn add_source(&mut self, source_id: &str, source: SourceSpec) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.ensure_loaded()?;
        if state.has_source(source_id) {
            return Err(EngineError::Duplicate(source_id.to_string()));
        }

        state.sources.push((source_id.to_string(), source));
        *state.source_adds.entry(source_id.to_string()).or_default() += 1;

        Ok(())
    }

    fn set_source_data(
        &mut self,
        source_id: &str,
        data: Arc<FeatureCollection>,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.ensure_loaded()?;
        match state.sources.iter_mut().find(|(id, _)| id == source_id) {
            Some((_, spec @ SourceSpec::GeoJson(_))) => {
                *spec = SourceSpec::GeoJson(data);
                Ok(())
            }
            _ => Err(EngineError::Missing(source_id.to_string())),
        }
    }

    fn remove_source(&mut self, source_id: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.ensure_loaded()?;
        if !state.has_source(source_id) {
            return Err(EngineError::Missing(source_id.to_string()));
        }
        if let Some(layer) = state
            .layers
            .iter()
            .find(|layer| layer.source.as_deref() == Some(source_id))
        {
            return Err(EngineError::InUse(source_id.to_string(), layer.id.clone()));
        }

        state.sources.retain(|(id, _)| id != source_id);
        Ok(())
    }

    fn has_layer(&self, layer_id: &str) -> bool {
        self.state.lock().has_layer(layer_id)
    }

    fn add_layer(&mut self, layer: &RenderLayerSpec) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.ensure_loaded()?;
        if state.has_layer(&layer.id) {
            return Err(EngineError::Duplicate(layer.id.clone()));
        }
        if let Some(source) = &layer.source {
            if !state.has_source(source) {
                return Err(EngineError::Missing(source.clone()));
            }
        }

        state.layers.push(layer.clone());
        Ok(())
    }

    fn remove_layer(&mut self, layer_id: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.ensure_loaded()?;
        if !state.has_layer(layer_id) {
            return Err(EngineError::Missing(layer_id.to_string()));
        }

        state.layers.retain(|layer| layer.id != layer_id);
        state.subscriptions.retain(|(id, _)| id != layer_id);
        Ok(())
    }

    fn set_layer_visibility(&mut self, layer_id: &str, visible: bool) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.ensure_loaded()?;
        match state.layers.iter_mut().find(|layer| layer.id == layer_id) {
            Some(layer) => {
                layer.visible = visible;
                Ok(())
            }
            None => Err(EngineError::Missing(layer_id.to_string())),
        }
    }

    fn set_terrain(&mut self, terrain: Option<TerrainSpec>) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.ensure_loaded()?;
        if let Some(spec) = &terrain {
            if !state.has_source(&spec.source) {
                return Err(EngineError::Missing(spec.source.clone()));
            }
        }

        state.terrain = terrain;
        Ok(())
    }

    fn subscribe(&mut self, layer_id: &str, event: LayerEvent) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        if !state.has_layer(layer_id) {
            return Err(EngineError::Missing(layer_id.to_string()));
        }

        state.subscriptions.insert((layer_id.to_string(), event));
        Ok(())
    }

    fn unsubscribe(&mut self, layer_id: &str, event: LayerEvent) {
        self.state
            .lock()
            .subscriptions
            .remove(&(layer_id.to_string(), event));
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.state.lock().cursor = cursor;
    }

    fn ease_to(&mut self, camera: CameraOptions) {
        self.state.lock().apply_camera(camera);
    }

    fn fly_to(&mut self, camera: CameraOptions) {
        self.state.lock().apply_camera(camera);
    }

    fn show_popup(&mut self, position: LngLat, html: &str) {
        self.state.lock().popups.push(Popup {
            position,
            html: html.to_string(),
        });
    }
}
