//! [Layers](Layer) are named, independently toggleable geospatial datasets served by the backend.
//!
//! A layer's lifecycle on the map is owned by the [`LayerRegistry`]: enabling a layer fetches its
//! features through the [`FeatureLoader`](loader::FeatureLoader), the
//! [dispatcher](dispatcher) turns them into sources and render layers on the
//! [map surface](crate::surface), and disabling removes exactly what was created.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub mod data_provider;
pub mod dispatcher;
pub mod loader;
pub mod popup;
pub mod registry;
pub mod symbol;

pub use registry::{EnabledLayerSet, LayerRegistry, LayerResourceRecord, LayerState};

/// Feature collection of one layer as returned by the backend.
pub type FeatureCollection = geojson::FeatureCollection;

/// Identifier of a layer in the backend catalog.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(u64);

impl LayerId {
    /// Creates a new id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Numeric value of the id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for LayerId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for LayerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declared geometry kind of a layer.
///
/// This is catalog metadata only. Rendering is decided by the geometry of the loaded features.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LayerType {
    /// Points and multi-points.
    Point,
    /// Line strings and multi-line strings.
    Line,
    /// Polygons and multi-polygons.
    Polygon,
    /// Anything else, including missing values.
    #[default]
    Unknown,
}

impl LayerType {
    /// Lowercase name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerType::Point => "point",
            LayerType::Line => "line",
            LayerType::Polygon => "polygon",
            LayerType::Unknown => "unknown",
        }
    }
}

impl From<&str> for LayerType {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "point" | "multipoint" => Self::Point,
            "line" | "linestring" | "multilinestring" => Self::Line,
            "polygon" | "multipolygon" => Self::Polygon,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for LayerType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<LayerType> for String {
    fn from(value: LayerType) -> Self {
        value.as_str().to_string()
    }
}

impl Display for LayerType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layer metadata as listed by the backend. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Layer identity.
    pub id: LayerId,
    /// Display name.
    pub name: String,
    /// Declared geometry type.
    #[serde(default, alias = "layerType", alias = "geom_type")]
    pub layer_type: LayerType,
    /// Optional description shown in the layer panel.
    #[serde(default)]
    pub description: Option<String>,
}

impl Layer {
    /// Creates layer metadata without a description.
    pub fn new(id: u64, name: impl Into<String>, layer_type: LayerType) -> Self {
        Self {
            id: LayerId(id),
            name: name.into(),
            layer_type,
            description: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
