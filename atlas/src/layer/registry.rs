//! Authority on which layers are on the map and which resources they own.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::error::{AtlasError, LoadError};
use crate::geo::BoundingBox;
use crate::layer::dispatcher::{self, GeometryFamily};
use crate::layer::loader::FeatureLoader;
use crate::layer::symbol::{SubStyle, SymbolSet};
use crate::layer::{FeatureCollection, Layer, LayerId};
use crate::messenger::Messenger;
use crate::surface::{MapSurface, SharedSurface};

/// Ids of the layers currently drawn on the map.
pub type EnabledLayerSet = BTreeSet<LayerId>;

/// State of a layer in the registry.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerState {
    /// Nothing of the layer is on the map.
    #[default]
    Disabled,
    /// Features are being loaded. Nothing of the layer is on the map yet.
    Pending,
    /// The layer is drawn and its resources are recorded.
    Enabled,
}

/// Everything created on the map surface for one enabled layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerResourceRecord {
    /// Source holding the features.
    pub source_id: String,
    /// Render layers in creation order.
    pub render_layers: Vec<(SubStyle, String)>,
    /// Render layers with a click handler.
    pub click_handlers: Vec<String>,
    /// Geometry family the layer was drawn as.
    pub family: Option<GeometryFamily>,
    /// Number of loaded features.
    pub feature_count: usize,
    /// Extent of the loaded features.
    pub bounds: Option<BoundingBox>,
}

impl LayerResourceRecord {
    /// Render layer ids in creation order.
    pub fn render_layer_ids(&self) -> impl Iterator<Item = &str> {
        self.render_layers.iter().map(|(_, id)| id.as_str())
    }
}

#[derive(Debug, Default)]
struct LayerEntry {
    state: LayerState,
    desired: bool,
    record: Option<LayerResourceRecord>,
    last_error: Option<LoadError>,
}

#[derive(Default)]
struct RegistryState {
    catalog: Vec<Layer>,
    entries: HashMap<LayerId, LayerEntry, ahash::RandomState>,
}

impl RegistryState {
    fn catalog_layer(&self, layer_id: LayerId) -> Option<&Layer> {
        self.catalog.iter().find(|layer| layer.id == layer_id)
    }
}

struct RegistryInner {
    state: Mutex<RegistryState>,
    loader: FeatureLoader,
    surface: SharedSurface,
    symbols: SymbolSet,
    messenger: Arc<dyn Messenger>,
    fly_to_zoom: f64,
}

impl RegistryInner {
    fn notify(&self, layer_id: LayerId, state: LayerState) {
        self.messenger.layer_state_changed(layer_id, state);
    }
}

/// The single authority on which layers are on the map.
///
/// Each layer moves through `Disabled → Pending → Enabled → Disabled`. Enabling loads the
/// features (the only suspension point), draws them and records every created resource before
/// the layer is reported as enabled. Disabling removes exactly the recorded resources.
///
/// A toggle arriving while the layer is `Pending` only updates the desired state; the in-flight
/// transition applies the latest desired state once the features arrive. A layer switched off
/// during loading is therefore never drawn.
///
/// The registry is cheap to clone; clones share state.
#[derive(Clone)]
pub struct LayerRegistry {
    inner: Arc<RegistryInner>,
}

impl LayerRegistry {
    /// Creates an empty registry drawing on the surface. `fly_to_zoom` is the zoom used by
    /// [`LayerRegistry::zoom_to`].
    pub fn new(
        loader: FeatureLoader,
        surface: SharedSurface,
        symbols: SymbolSet,
        messenger: Arc<dyn Messenger>,
        fly_to_zoom: f64,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                state: Mutex::new(RegistryState::default()),
                loader,
                surface,
                symbols,
                messenger,
                fly_to_zoom,
            }),
        }
    }

    /// Replaces the layer catalog.
    pub fn set_catalog(&self, layers: Vec<Layer>) {
        info!("Layer catalog updated with {} layers", layers.len());
        self.inner.state.lock().catalog = layers;
    }

    /// Layers of the catalog.
    pub fn layers(&self) -> Vec<Layer> {
        self.inner.state.lock().catalog.clone()
    }

    /// Catalog entry of the layer.
    pub fn layer(&self, layer_id: LayerId) -> Option<Layer> {
        self.inner.state.lock().catalog_layer(layer_id).cloned()
    }

    /// Current state of the layer.
    pub fn state(&self, layer_id: LayerId) -> LayerState {
        self.inner
            .state
            .lock()
            .entries
            .get(&layer_id)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    /// State the layer is heading to: true if it is enabled, or loading and not switched off
    /// since.
    pub fn is_desired(&self, layer_id: LayerId) -> bool {
        self.inner
            .state
            .lock()
            .entries
            .get(&layer_id)
            .is_some_and(|entry| entry.desired)
    }

    /// Layers currently on the map.
    pub fn enabled_layers(&self) -> EnabledLayerSet {
        self.inner
            .state
            .lock()
            .entries
            .iter()
            .filter(|(_, entry)| entry.state == LayerState::Enabled)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Resources created for an enabled layer.
    pub fn record(&self, layer_id: LayerId) -> Option<LayerResourceRecord> {
        self.inner
            .state
            .lock()
            .entries
            .get(&layer_id)
            .and_then(|entry| entry.record.clone())
    }

    /// Error of the last failed enable attempt. Cleared when the layer is enabled again.
    pub fn last_error(&self, layer_id: LayerId) -> Option<LoadError> {
        self.inner
            .state
            .lock()
            .entries
            .get(&layer_id)
            .and_then(|entry| entry.last_error.clone())
    }

    /// Switches a layer on or off and returns its state once the transition settles.
    ///
    /// Returns [`LayerState::Pending`] without waiting if another transition of the layer is in
    /// flight. Fails with [`AtlasError::Load`] if the features could not be loaded; the layer
    /// stays disabled and can be enabled again right away.
    pub async fn toggle(
        &self,
        layer_id: LayerId,
        enabled: bool,
    ) -> Result<LayerState, AtlasError> {
        let layer = {
            let mut state = self.inner.state.lock();
            let layer = state.catalog_layer(layer_id).cloned();
            if layer.is_none() && !state.entries.contains_key(&layer_id) {
                return Err(AtlasError::UnknownLayer(layer_id));
            }
            let entry = state.entries.entry(layer_id).or_default();

            match (entry.state, enabled) {
                (LayerState::Pending, _) => {
                    debug!("Layer {layer_id} is loading, desired state set to {enabled}");
                    entry.desired = enabled;
                    return Ok(LayerState::Pending);
                }
                (LayerState::Enabled, true) | (LayerState::Disabled, false) => {
                    entry.desired = enabled;
                    return Ok(entry.state);
                }
                (LayerState::Enabled, false) => {
                    if let Some(record) = entry.record.take() {
                        let mut surface = self.inner.surface.lock();
                        remove_resources(&mut *surface, layer_id, &record);
                    }
                    entry.state = LayerState::Disabled;
                    entry.desired = false;
                    drop(state);

                    info!("Layer {layer_id} disabled");
                    self.inner.notify(layer_id, LayerState::Disabled);
                    return Ok(LayerState::Disabled);
                }
                (LayerState::Disabled, true) => {
                    // Layers removed from the catalog can still be switched off, but not on.
                    let layer = layer.ok_or(AtlasError::UnknownLayer(layer_id))?;
                    entry.state = LayerState::Pending;
                    entry.desired = true;
                    entry.last_error = None;
                    layer
                }
            }
        };

        info!("Enabling layer {layer_id} ({})", layer.name);
        self.inner.notify(layer_id, LayerState::Pending);

        let mut transition = PendingTransition {
            inner: &self.inner,
            layer_id,
            settled: false,
        };
        let result = self.inner.loader.load(layer_id).await;
        transition.settled = true;

        self.settle(&layer, result)
    }

    fn settle(
        &self,
        layer: &Layer,
        result: Result<Arc<FeatureCollection>, LoadError>,
    ) -> Result<LayerState, AtlasError> {
        let layer_id = layer.id;
        let mut state = self.inner.state.lock();
        let entry = state.entries.entry(layer_id).or_default();

        let outcome = match result {
            Ok(collection) if entry.desired => {
                let record = {
                    let mut surface = self.inner.surface.lock();
                    dispatcher::realize(layer, collection, &self.inner.symbols, &mut *surface)
                };
                entry.record = Some(record);
                entry.state = LayerState::Enabled;
                Ok(LayerState::Enabled)
            }
            Ok(_) => {
                info!("Layer {layer_id} was switched off while loading, features discarded");
                entry.state = LayerState::Disabled;
                Ok(LayerState::Disabled)
            }
            Err(err) if !entry.desired => {
                debug!("Layer {layer_id} was switched off while loading, ignoring error: {err}");
                entry.state = LayerState::Disabled;
                Ok(LayerState::Disabled)
            }
            Err(err) => {
                entry.state = LayerState::Disabled;
                entry.desired = false;
                entry.last_error = Some(err.clone());
                Err(AtlasError::Load(err))
            }
        };
        drop(state);

        match &outcome {
            Ok(new_state) => self.inner.notify(layer_id, *new_state),
            Err(err) => {
                warn!("Layer {layer_id} could not be enabled: {err}");
                self.inner.notify(layer_id, LayerState::Disabled);
            }
        }

        outcome
    }

    /// Flies the camera to the features of an enabled layer. Returns false if the layer is not
    /// enabled or has no features.
    pub fn zoom_to(&self, layer_id: LayerId) -> bool {
        let Some(bounds) = self.record(layer_id).and_then(|record| record.bounds) else {
            return false;
        };

        self.inner
            .surface
            .lock()
            .fly_to(bounds.center(), self.inner.fly_to_zoom);
        true
    }

    /// Shows or hides all render layers of an enabled layer without removing them. Returns false
    /// if the layer is not enabled.
    pub fn set_visible(&self, layer_id: LayerId, visible: bool) -> bool {
        let state = self.inner.state.lock();
        let Some(record) = state
            .entries
            .get(&layer_id)
            .and_then(|entry| entry.record.as_ref())
        else {
            return false;
        };

        let mut surface = self.inner.surface.lock();
        for render_layer_id in record.render_layer_ids() {
            surface.set_layer_visibility(render_layer_id, visible);
        }

        true
    }
}

/// Reverts a layer to `Disabled` if the enable future is dropped before the features arrive.
struct PendingTransition<'a> {
    inner: &'a RegistryInner,
    layer_id: LayerId,
    settled: bool,
}

impl Drop for PendingTransition<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let reverted = {
            let mut state = self.inner.state.lock();
            match state.entries.get_mut(&self.layer_id) {
                Some(entry) if entry.state == LayerState::Pending => {
                    entry.state = LayerState::Disabled;
                    entry.desired = false;
                    true
                }
                _ => false,
            }
        };

        if reverted {
            warn!("Enabling layer {} was cancelled", self.layer_id);
            self.inner.notify(self.layer_id, LayerState::Disabled);
        }
    }
}

/// Removes the recorded resources of a layer, then sweeps the ids derived from the layer id in
/// case anything was created outside of the record.
fn remove_resources(surface: &mut dyn MapSurface, layer_id: LayerId, record: &LayerResourceRecord) {
    let derived_layers = dispatcher::all_render_layer_ids(layer_id);

    for render_layer_id in record.click_handlers.iter().chain(&derived_layers) {
        surface.unregister_click_handler(render_layer_id);
    }

    for render_layer_id in record
        .render_layers
        .iter()
        .rev()
        .map(|(_, id)| id)
        .chain(&derived_layers)
    {
        surface.remove_render_layer(render_layer_id);
    }

    surface.remove_source(&record.source_id);
    surface.remove_source(&dispatcher::source_id(layer_id));
}
