use async_trait::async_trait;
use bytes::Bytes;
use log::{info, trace};
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::error::{AtlasError, LoadError};
use crate::geo::BoundingBox;
use crate::layer::data_provider::FeatureProvider;
use crate::layer::{FeatureCollection, Layer, LayerId};

/// Loads layers from the REST backend.
///
/// * `GET {base_url}/layers` returns the layer catalog,
/// * `GET {base_url}/layers/{id}/features?bbox=xmin,ymin,xmax,ymax` returns a GeoJSON
///   feature collection of one layer.
///
/// Both endpoints may wrap their payload in a paginated object with a `results` field.
#[derive(Debug, Clone)]
pub struct RestFeatureProvider {
    http_client: reqwest::Client,
    base_url: String,
}

impl RestFeatureProvider {
    /// Creates a provider for the API rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self, AtlasError> {
        let http_client = reqwest::Client::builder().user_agent(user_agent).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Url of the layer catalog.
    pub fn layers_url(&self) -> String {
        format!("{}/layers", self.base_url)
    }

    /// Url of the feature collection of the layer.
    pub fn features_url(&self, layer_id: LayerId, bbox: Option<BoundingBox>) -> String {
        let mut url = format!("{}/layers/{layer_id}/features", self.base_url);
        if let Some(bbox) = bbox {
            url.push_str("?bbox=");
            url.push_str(&bbox.to_query());
        }

        url
    }

    async fn load_bytes(&self, url: &str) -> Result<Bytes, LoadError> {
        trace!("Requesting {url}");
        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            info!("Failed to load {url}: {status}");
            return Err(LoadError::Status(status.as_u16()));
        }

        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl FeatureProvider for RestFeatureProvider {
    async fn load_layers(&self) -> Result<Vec<Layer>, LoadError> {
        let bytes = self.load_bytes(&self.layers_url()).await?;
        let layers = decode_layers(&bytes)?;
        info!("Loaded catalog with {} layers", layers.len());

        Ok(layers)
    }

    async fn load_features(
        &self,
        layer_id: LayerId,
        bbox: Option<BoundingBox>,
    ) -> Result<FeatureCollection, LoadError> {
        let url = self.features_url(layer_id, bbox);
        let bytes = self.load_bytes(&url).await?;
        trace!("Layer {layer_id} loaded. Byte size: {}", bytes.len());

        decode_features(&bytes)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Plain(T),
    Paginated { results: T },
}

impl<T> Listing<T> {
    fn into_inner(self) -> T {
        match self {
            Listing::Plain(v) | Listing::Paginated { results: v } => v,
        }
    }
}

fn decode_layers(bytes: &[u8]) -> Result<Vec<Layer>, LoadError> {
    Ok(serde_json::from_slice::<Listing<Vec<Layer>>>(bytes)?.into_inner())
}

fn decode_features(bytes: &[u8]) -> Result<FeatureCollection, LoadError> {
    Ok(serde_json::from_slice::<Listing<FeatureCollection>>(bytes)?.into_inner())
}
