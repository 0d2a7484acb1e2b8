//! Backend access for layer metadata and layer features.

mod rest_provider;

use async_trait::async_trait;

pub use rest_provider::RestFeatureProvider;

use crate::error::LoadError;
use crate::geo::BoundingBox;
use crate::layer::{FeatureCollection, Layer, LayerId};

/// Source of layer metadata and feature collections.
///
/// The default implementation is [`RestFeatureProvider`]. Applications can provide their own
/// implementation to load data from other places (files, fixtures, an offline store).
#[async_trait]
pub trait FeatureProvider: Send + Sync {
    /// Loads the list of layers available for display.
    async fn load_layers(&self) -> Result<Vec<Layer>, LoadError>;

    /// Loads features of the layer, optionally limited to the given extent.
    async fn load_features(
        &self,
        layer_id: LayerId,
        bbox: Option<BoundingBox>,
    ) -> Result<FeatureCollection, LoadError>;
}
