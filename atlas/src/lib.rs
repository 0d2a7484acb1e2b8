//! Atlas is a dynamic map-layer engine. It draws thematic GIS layers served by a REST feature
//! service on top of an interactive base map, and keeps them consistent while the user toggles
//! layers, switches to 3D terrain or changes the base map to dark mode.
//!
//! # Quick start
//!
//! ```no_run
//! use atlas::{AtlasBuilder, AtlasConfig};
//! use atlas::layer::LayerId;
//! use atlas::surface::MemoryEngine;
//!
//! # tokio_test::block_on(async {
//! let atlas = AtlasBuilder::default()
//!     .with_config(AtlasConfig::default().with_env_overrides())
//!     .build(MemoryEngine::synchronous())?;
//!
//! atlas.load_catalog().await?;
//! atlas.toggle_layer(LayerId::new(7), true).await?;
//! atlas.toggle_dark_mode();
//! # Ok::<(), atlas::error::AtlasError>(())
//! # });
//! ```
//!
//! # Main components
//!
//! * The [`surface`] facade wraps a [`MapEngine`](surface::MapEngine), the renderer that
//!   actually draws the map. Every operation on it is idempotent, and it puts all sources and
//!   render layers back after the base map style is swapped.
//! * The [`LayerRegistry`](layer::LayerRegistry) is the single authority on which layers are on
//!   the map. It loads features through the [`FeatureLoader`](layer::loader::FeatureLoader),
//!   which merges concurrent requests for the same layer, and draws them according to their
//!   geometry.
//! * The [`ModeController`](mode::ModeController) owns the 3D and dark mode flags.
//! * The [`control`] module is the panel shell: it turns user intent into calls on the above.
//!
//! The [`Atlas`] struct ties these together around one map.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

mod atlas;
mod color;
pub mod config;
pub mod control;
pub mod error;
pub mod geo;
pub mod layer;
mod messenger;
pub mod mode;
pub mod surface;

#[cfg(test)]
mod tests;

pub use atlas::{Atlas, AtlasBuilder};
pub use color::Color;
pub use config::AtlasConfig;
pub use geo::{BoundingBox, LngLat};
pub use layer::symbol;
pub use messenger::{DummyMessenger, Messenger};
