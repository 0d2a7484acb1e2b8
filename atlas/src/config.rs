//! Configuration of the map-layer engine.
//!
//! Every field has a default, so an empty JSON object is a valid configuration:
//!
//! ```json
//! {
//!   "api_base_url": "https://gis.example.org/api/v1",
//!   "request_timeout_ms": 10000,
//!   "styles": { "dark": "mapbox://styles/mapbox/navigation-night-v1" },
//!   "terrain": { "exaggeration": 2.0 }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::AtlasError;
use crate::geo::BoundingBox;
use crate::layer::symbol::SymbolSet;

/// Environment variable overriding [`AtlasConfig::api_base_url`].
pub const API_URL_ENV: &str = "ATLAS_API_URL";

/// Top level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Root of the feature service REST API.
    pub api_base_url: String,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Maximum duration of a feature request in milliseconds.
    pub request_timeout_ms: u64,
    /// Extent every feature request is limited to.
    pub bbox: Option<BoundingBox>,
    /// Base map styles.
    pub styles: StyleConfig,
    /// 3D terrain settings.
    pub terrain: TerrainConfig,
    /// Camera animation settings.
    pub camera: CameraConfig,
    /// Symbols of each geometry family.
    pub symbols: SymbolSet,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api/v1".to_string(),
            user_agent: format!("atlas/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_ms: 30_000,
            bbox: None,
            styles: StyleConfig::default(),
            terrain: TerrainConfig::default(),
            camera: CameraConfig::default(),
            symbols: SymbolSet::default(),
        }
    }
}

impl AtlasConfig {
    /// Parses configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, AtlasError> {
        serde_json::from_str(json).map_err(|err| AtlasError::Config(err.to_string()))
    }

    /// Reads configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AtlasError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        info!("Loaded configuration from {}", path.display());

        Self::from_json(&json)
    }

    /// Applies overrides from the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_api_url_override(std::env::var(API_URL_ENV).ok())
    }

    fn with_api_url_override(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
            info!("Using feature service at {url} from {API_URL_ENV}");
            self.api_base_url = url;
        }

        self
    }

    /// Feature request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Checks values that serde cannot.
    pub fn validate(&self) -> Result<(), AtlasError> {
        if self.api_base_url.trim().is_empty() {
            return Err(AtlasError::Config("api_base_url is empty".into()));
        }

        if self.request_timeout_ms == 0 {
            return Err(AtlasError::Config("request_timeout_ms must be positive".into()));
        }

        let exaggeration = self.terrain.exaggeration;
        if exaggeration.is_nan() || exaggeration <= 0.0 {
            return Err(AtlasError::Config(format!(
                "terrain exaggeration must be positive, got {exaggeration}"
            )));
        }

        Ok(())
    }
}

/// Base map styles for light and dark mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Light style url.
    pub light: String,
    /// Dark style url.
    pub dark: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            light: "mapbox://styles/mapbox/streets-v12".to_string(),
            dark: "mapbox://styles/mapbox/dark-v11".to_string(),
        }
    }
}

impl StyleConfig {
    /// Style for the given mode.
    pub fn for_mode(&self, is_dark: bool) -> &str {
        if is_dark {
            &self.dark
        } else {
            &self.light
        }
    }
}

/// 3D terrain settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Raster DEM tileset.
    pub dem_url: String,
    /// DEM tile size in pixels.
    pub tile_size: u32,
    /// Maximum zoom level of DEM tiles.
    pub max_zoom: u8,
    /// Elevation exaggeration applied in 3D mode.
    pub exaggeration: f64,
    /// Camera pitch in 3D mode, degrees.
    pub pitch: f64,
    /// Duration of the pitch animation in milliseconds.
    pub transition_ms: u64,
    /// Sun intensity of the sky overlay.
    pub sky_sun_intensity: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            dem_url: "mapbox://mapbox.mapbox-terrain-dem-v1".to_string(),
            tile_size: 512,
            max_zoom: 14,
            exaggeration: 1.5,
            pitch: 60.0,
            transition_ms: 1000,
            sky_sun_intensity: 15.0,
        }
    }
}

impl TerrainConfig {
    /// Duration of the pitch animation.
    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

/// Camera animation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Zoom level used when flying to a layer or feature.
    pub fly_to_zoom: f64,
    /// Flight duration in milliseconds.
    pub fly_to_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fly_to_zoom: 14.0,
            fly_to_ms: 2000,
        }
    }
}

impl CameraConfig {
    /// Flight duration.
    pub fn fly_to_duration(&self) -> Duration {
        Duration::from_millis(self.fly_to_ms)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::Color;

    #[test]
    fn empty_document_gives_defaults() {
        let config = AtlasConfig::from_json("{}").unwrap();
        assert_eq!(config, AtlasConfig::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.styles.for_mode(true), "mapbox://styles/mapbox/dark-v11");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = AtlasConfig::from_json(
            r##"{
                "api_base_url": "https://gis.example.org/api/v1",
                "bbox": {"x_min": 102.1, "y_min": 8.2, "x_max": 109.5, "y_max": 23.4},
                "terrain": {"exaggeration": 2.0},
                "symbols": {"polygon": {"fill_color": "#E74C3C"}}
            }"##,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://gis.example.org/api/v1");
        assert_eq!(config.bbox.unwrap().to_query(), "102.1,8.2,109.5,23.4");
        assert_eq!(config.terrain.exaggeration, 2.0);
        assert_eq!(config.terrain.pitch, 60.0);
        assert_eq!(config.symbols.polygon.fill_color, Color::RED);
        assert_eq!(config.symbols.polygon.fill_opacity, 0.3);
    }

    #[test]
    fn invalid_document_is_config_error() {
        assert_matches!(
            AtlasConfig::from_json(r#"{"request_timeout_ms": "soon"}"#),
            Err(AtlasError::Config(_))
        );

        let config = AtlasConfig {
            request_timeout_ms: 0,
            ..Default::default()
        };
        assert_matches!(config.validate(), Err(AtlasError::Config(_)));
    }

    #[test]
    fn api_url_override() {
        let config = AtlasConfig::default()
            .with_api_url_override(Some("http://10.0.0.2:8000/api/v1".to_string()));
        assert_eq!(config.api_base_url, "http://10.0.0.2:8000/api/v1");

        let config = AtlasConfig::default().with_api_url_override(Some("  ".to_string()));
        assert_eq!(config.api_base_url, AtlasConfig::default().api_base_url);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert_matches!(
            AtlasConfig::from_file("/nonexistent/atlas.json"),
            Err(AtlasError::FsIo(_))
        );
    }
}
