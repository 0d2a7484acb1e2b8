use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use geojson::{Feature, Geometry, Value};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::watch;

use crate::config::{CameraConfig, StyleConfig};
use crate::error::LoadError;
use crate::geo::BoundingBox;
use crate::layer::data_provider::FeatureProvider;
use crate::layer::loader::{FeatureLoader, DEFAULT_REQUEST_TIMEOUT};
use crate::layer::symbol::SymbolSet;
use crate::layer::{FeatureCollection, Layer, LayerId, LayerRegistry, LayerState};
use crate::messenger::Messenger;
use crate::mode::RenderMode;
use crate::surface::{MemoryEngine, SharedSurface, Surface};

/// In-memory feature service.
#[derive(Default)]
pub struct TestProvider {
    layers: Vec<Layer>,
    features: HashMap<u64, FeatureCollection>,
    failures: Mutex<HashMap<u64, LoadError>>,
    calls: Mutex<HashMap<u64, usize>>,
    gate: Option<watch::Sender<bool>>,
    delay: Option<Duration>,
}

impl TestProvider {
    pub fn with_layer(mut self, layer: Layer, features: FeatureCollection) -> Self {
        self.features.insert(layer.id.get(), features);
        self.layers.push(layer);
        self
    }

    pub fn with_features(mut self, layer_id: u64, features: FeatureCollection) -> Self {
        self.features.insert(layer_id, features);
        self
    }

    /// The next request for the layer fails.
    pub fn failing(self, layer_id: u64, error: LoadError) -> Self {
        self.fail_next(layer_id, error);
        self
    }

    pub fn fail_next(&self, layer_id: u64, error: LoadError) {
        self.failures.lock().insert(layer_id, error);
    }

    /// Requests block until [`TestProvider::open_gate`] is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(watch::channel(false).0);
        self
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.send_replace(true);
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self, layer_id: u64) -> usize {
        self.calls.lock().get(&layer_id).copied().unwrap_or(0)
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl FeatureProvider for TestProvider {
    async fn load_layers(&self) -> Result<Vec<Layer>, LoadError> {
        Ok(self.layers.clone())
    }

    async fn load_features(
        &self,
        layer_id: LayerId,
        _bbox: Option<BoundingBox>,
    ) -> Result<FeatureCollection, LoadError> {
        let id = layer_id.get();
        *self.calls.lock().entry(id).or_default() += 1;

        if let Some(gate) = &self.gate {
            let mut open = gate.subscribe();
            let _ = open.wait_for(|is_open| *is_open).await;
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failures.lock().remove(&id) {
            return Err(error);
        }

        Ok(self
            .features
            .get(&id)
            .cloned()
            .unwrap_or_else(|| collection(vec![])))
    }
}

/// Yields until the provider received the given number of requests for the layer.
pub async fn wait_for_calls(provider: &TestProvider, layer_id: u64, count: usize) {
    while provider.calls(layer_id) < count {
        tokio::task::yield_now().await;
    }
}

#[derive(Default)]
pub struct RecordingMessenger {
    layer_events: Mutex<Vec<(LayerId, LayerState)>>,
    mode_events: Mutex<Vec<RenderMode>>,
}

impl RecordingMessenger {
    pub fn layer_events(&self) -> Vec<(LayerId, LayerState)> {
        self.layer_events.lock().clone()
    }

    pub fn mode_events(&self) -> Vec<RenderMode> {
        self.mode_events.lock().clone()
    }
}

impl Messenger for RecordingMessenger {
    fn layer_state_changed(&self, layer_id: LayerId, state: LayerState) {
        self.layer_events.lock().push((layer_id, state));
    }

    fn render_mode_changed(&self, mode: RenderMode) {
        self.mode_events.lock().push(mode);
    }
}

pub struct RegistryFixture {
    pub registry: LayerRegistry,
    pub engine: MemoryEngine,
    pub surface: SharedSurface,
}

pub fn test_registry(provider: Arc<TestProvider>) -> RegistryFixture {
    test_registry_with(provider, Arc::new(RecordingMessenger::default()))
}

pub fn test_registry_with(
    provider: Arc<TestProvider>,
    messenger: Arc<dyn Messenger>,
) -> RegistryFixture {
    let engine = MemoryEngine::synchronous();
    let surface: SharedSurface = Arc::new(Mutex::new(Surface::new(
        engine.clone(),
        StyleConfig::default().light,
    )));
    let catalog = provider.layers.clone();
    let loader = FeatureLoader::new(provider, DEFAULT_REQUEST_TIMEOUT);
    let registry = LayerRegistry::new(
        loader,
        surface.clone(),
        SymbolSet::default(),
        messenger,
        CameraConfig::default().fly_to_zoom,
    );
    registry.set_catalog(catalog);

    RegistryFixture {
        registry,
        engine,
        surface,
    }
}

pub fn feature(value: Value, properties: serde_json::Value) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: properties.as_object().cloned(),
        foreign_members: None,
    }
}

pub fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn point_collection(points: &[[f64; 2]]) -> FeatureCollection {
    collection(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| feature(Value::Point(p.to_vec()), json!({ "id": i + 1 })))
            .collect(),
    )
}

pub fn line_collection(lines: &[&[[f64; 2]]]) -> FeatureCollection {
    collection(
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let positions = line.iter().map(|p| p.to_vec()).collect();
                feature(Value::LineString(positions), json!({ "id": i + 1 }))
            })
            .collect(),
    )
}

pub fn polygon_collection(rings: &[&[[f64; 2]]]) -> FeatureCollection {
    collection(
        rings
            .iter()
            .enumerate()
            .map(|(i, ring)| {
                let positions = ring.iter().map(|p| p.to_vec()).collect();
                feature(Value::Polygon(vec![positions]), json!({ "id": i + 1 }))
            })
            .collect(),
    )
}

pub fn schools_collection() -> FeatureCollection {
    collection(vec![
        feature(
            Value::Point(vec![105.85, 21.03]),
            json!({"id": 1, "name": "School A", "capacity": 200}),
        ),
        feature(
            Value::Point(vec![105.80, 21.00]),
            json!({"id": 2, "name": "School B", "capacity": 450}),
        ),
        feature(
            Value::Point(vec![105.90, 21.05]),
            json!({"id": 3, "name": "School C", "capacity": null}),
        ),
    ])
}
