//! Error types used by the crate.

use std::time::Duration;

use thiserror::Error;

use crate::layer::LayerId;

/// Error loading layer data from the feature service.
///
/// The error is cloneable because a single failed request is reported to every caller that was
/// waiting for the same layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Could not connect to the feature service, or the connection broke mid-response.
    #[error("failed to reach the feature service: {0}")]
    Network(String),
    /// The service answered with a non-success HTTP status.
    #[error("feature service responded with status {0}")]
    Status(u16),
    /// The request did not complete within the configured time.
    #[error("feature request timed out after {0:?}")]
    Timeout(Duration),
    /// The response body is not a valid layer list or feature collection.
    #[error("failed to decode response: {0}")]
    Decoding(String),
}

impl From<reqwest::Error> for LoadError {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => Self::Status(status.as_u16()),
            None => Self::Network(value.to_string()),
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decoding(value.to_string())
    }
}

/// Failure reported by a raw [`MapEngine`](crate::surface::MapEngine) call.
///
/// These never leave the [`Surface`](crate::surface::Surface) facade: the engine boundary is
/// racy, so the facade logs them and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A source or render layer with this id already exists.
    #[error("resource `{0}` already exists")]
    Duplicate(String),
    /// A source or render layer with this id does not exist.
    #[error("resource `{0}` does not exist")]
    Missing(String),
    /// The source is still referenced by a render layer.
    #[error("source `{0}` is used by render layer `{1}`")]
    InUse(String, String),
    /// The style document is still loading, the engine does not accept changes yet.
    #[error("style is not done loading")]
    StyleNotLoaded,
}

/// Atlas error type.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// Loading layer data failed. The layer stays disabled.
    #[error("failed to load layer data")]
    Load(#[from] LoadError),
    /// The layer id is not present in the layer catalog.
    #[error("layer {0} is not in the catalog")]
    UnknownLayer(LayerId),
    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// HTTP client could not be constructed.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    /// Error reading data from the FS.
    #[error("failed to read file")]
    FsIo(#[from] std::io::Error),
}

impl AtlasError {
    /// Returns the load error if this error was caused by a failed data request.
    pub fn as_load_error(&self) -> Option<&LoadError> {
        match self {
            Self::Load(err) => Some(err),
            _ => None,
        }
    }
}
