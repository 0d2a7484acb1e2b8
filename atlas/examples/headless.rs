//! This example drives the layer engine without a window, using the in-memory map engine.
//!
//! Run it with a path to a `.geojson` file to show the file as a layer:
//!
//! ```shell
//! cargo run --example headless -- ./schools.geojson
//! ```
//!
//! Without an argument the layer catalog is loaded from the feature service configured with the
//! `ATLAS_API_URL` environment variable, and the first layer of the catalog is enabled.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use atlas::error::LoadError;
use atlas::layer::data_provider::FeatureProvider;
use atlas::layer::{FeatureCollection, Layer, LayerId, LayerType};
use atlas::surface::{EngineEvent, MemoryEngine};
use atlas::{AtlasBuilder, AtlasConfig, BoundingBox};
use geojson::GeoJson;

/// Serves one GeoJSON file as layer 1.
struct FileProvider {
    name: String,
    features: FeatureCollection,
}

#[async_trait]
impl FeatureProvider for FileProvider {
    async fn load_layers(&self) -> Result<Vec<Layer>, LoadError> {
        Ok(vec![Layer::new(1, &self.name, LayerType::Unknown)])
    }

    async fn load_features(
        &self,
        _layer_id: LayerId,
        _bbox: Option<BoundingBox>,
    ) -> Result<FeatureCollection, LoadError> {
        Ok(self.features.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let engine = MemoryEngine::new();
    let mut builder =
        AtlasBuilder::default().with_config(AtlasConfig::default().with_env_overrides());

    if let Some(file_name) = std::env::args().nth(1) {
        let json = std::fs::read_to_string(&file_name)?;
        let features = FeatureCollection::try_from(json.parse::<GeoJson>()?)?;
        builder = builder.with_provider(Arc::new(FileProvider {
            name: file_name,
            features,
        }));
    }

    let atlas = builder.build(engine.clone())?;
    engine.finish_style_load();
    atlas.handle_event(EngineEvent::StyleLoaded);

    let catalog = atlas.load_catalog().await?;
    let layer = catalog
        .first()
        .ok_or_else(|| anyhow!("the feature service has no layers"))?;

    let state = atlas.toggle_layer(layer.id, true).await?;
    println!("Layer '{}' is {state:?}", layer.name);
    println!("Render layers: {:?}", engine.layer_ids());

    atlas.toggle_3d();
    atlas.toggle_dark_mode();
    engine.finish_style_load();
    atlas.handle_event(EngineEvent::StyleLoaded);

    println!("Style: {}", engine.style().unwrap_or_default());
    println!("Render layers after style swap: {:?}", engine.layer_ids());
    println!("Sources after style swap: {:?}", engine.source_ids());

    for row in atlas.panel().rows {
        println!("[{}] {}", if row.is_checked() { "x" } else { " " }, row.name);
    }

    Ok(())
}
