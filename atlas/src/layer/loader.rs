//! Feature loading with one shared request per layer in flight.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::{debug, warn};
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use web_time::Instant;

use crate::error::LoadError;
use crate::geo::BoundingBox;
use crate::layer::data_provider::FeatureProvider;
use crate::layer::{FeatureCollection, LayerId};

/// Default time a feature request may take before it fails with [`LoadError::Timeout`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type LoadResult = Result<Arc<FeatureCollection>, LoadError>;

/// Loads feature collections of layers on demand.
///
/// Concurrent loads of the same layer share one provider request: every caller waits on the same
/// cell and receives the same result. The cell is forgotten as soon as the request settles, so the
/// next enable transition fetches fresh data.
pub struct FeatureLoader {
    provider: Arc<dyn FeatureProvider>,
    timeout: Duration,
    bbox: Option<BoundingBox>,
    in_flight: Mutex<HashMap<LayerId, Weak<OnceCell<LoadResult>>, ahash::RandomState>>,
}

impl FeatureLoader {
    /// Creates a new loader that fails requests taking longer than `timeout`.
    pub fn new(provider: Arc<dyn FeatureProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            bbox: None,
            in_flight: Mutex::new(HashMap::default()),
        }
    }

    /// Limits every request to the given extent.
    pub fn with_bbox(mut self, bbox: Option<BoundingBox>) -> Self {
        self.bbox = bbox;
        self
    }

    /// Provider the loader requests data from.
    pub fn provider(&self) -> &Arc<dyn FeatureProvider> {
        &self.provider
    }

    /// Loads features of the layer, joining a request already in flight for it.
    pub async fn load(&self, layer_id: LayerId) -> Result<Arc<FeatureCollection>, LoadError> {
        let cell = self.start_loading(layer_id);
        let result = cell.get_or_init(|| self.fetch(layer_id)).await.clone();
        self.finish_loading(layer_id, &cell);

        result
    }

    /// Returns true if a request for the layer is currently in flight.
    pub fn is_loading(&self, layer_id: LayerId) -> bool {
        self.in_flight
            .lock()
            .get(&layer_id)
            .is_some_and(|cell| cell.strong_count() > 0)
    }

    fn start_loading(&self, layer_id: LayerId) -> Arc<OnceCell<LoadResult>> {
        let mut in_flight = self.in_flight.lock();
        if let Some(cell) = in_flight.get(&layer_id).and_then(Weak::upgrade) {
            debug!("Joining in-flight request for layer {layer_id}");
            return cell;
        }

        let cell = Arc::new(OnceCell::new());
        in_flight.insert(layer_id, Arc::downgrade(&cell));

        cell
    }

    fn finish_loading(&self, layer_id: LayerId, cell: &Arc<OnceCell<LoadResult>>) {
        let mut in_flight = self.in_flight.lock();
        let is_same_request = in_flight
            .get(&layer_id)
            .is_some_and(|stored| stored.as_ptr() == Arc::as_ptr(cell));
        if is_same_request {
            in_flight.remove(&layer_id);
        }
    }

    async fn fetch(&self, layer_id: LayerId) -> LoadResult {
        let started = Instant::now();
        let request = self.provider.load_features(layer_id, self.bbox);
        let result = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(collection)) => Ok(Arc::new(collection)),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(LoadError::Timeout(self.timeout)),
        };

        match &result {
            Ok(collection) => debug!(
                "Loaded {} features of layer {layer_id} in {} ms",
                collection.features.len(),
                started.elapsed().as_millis()
            ),
            Err(err) => warn!("Failed to load features of layer {layer_id}: {err}"),
        }

        result
    }
}
