use std::sync::Arc;

use log::info;
use parking_lot::Mutex;

use crate::config::AtlasConfig;
use crate::control::{IntentOutcome, LayerPanel, PanelIntent};
use crate::error::AtlasError;
use crate::layer::data_provider::{FeatureProvider, RestFeatureProvider};
use crate::layer::loader::FeatureLoader;
use crate::layer::{Layer, LayerId, LayerRegistry, LayerState};
use crate::messenger::{DummyMessenger, Messenger};
use crate::mode::{ModeController, RenderMode};
use crate::surface::{EngineEvent, MapEngine, SharedSurface, Surface};

/// Map-layer engine around one live map.
///
/// Owns the map surface, the layer registry and the mode controller, and routes panel intent and
/// engine events to them. Create it with [`AtlasBuilder`].
pub struct Atlas {
    config: AtlasConfig,
    provider: Arc<dyn FeatureProvider>,
    surface: SharedSurface,
    registry: LayerRegistry,
    modes: ModeController,
}

impl Atlas {
    /// Configuration the engine was built with.
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Shared map surface.
    pub fn surface(&self) -> &SharedSurface {
        &self.surface
    }

    /// Layer registry.
    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    /// Current render mode.
    pub fn mode(&self) -> RenderMode {
        self.modes.mode()
    }

    /// Fetches the layer catalog from the provider and makes it available for toggling.
    pub async fn load_catalog(&self) -> Result<Vec<Layer>, AtlasError> {
        let layers = self.provider.load_layers().await?;
        self.registry.set_catalog(layers.clone());

        Ok(layers)
    }

    /// Switches a layer on or off. See [`LayerRegistry::toggle`].
    pub async fn toggle_layer(
        &self,
        layer_id: LayerId,
        enabled: bool,
    ) -> Result<LayerState, AtlasError> {
        self.registry.toggle(layer_id, enabled).await
    }

    /// Switches 3D terrain.
    pub fn toggle_3d(&self) -> RenderMode {
        self.modes.toggle_3d()
    }

    /// Switches dark base map.
    pub fn toggle_dark_mode(&self) -> RenderMode {
        self.modes.toggle_dark_mode()
    }

    /// Feeds an event of the map engine to the surface.
    pub fn handle_event(&self, event: EngineEvent) {
        self.surface.lock().handle_event(event);
    }

    /// Applies user intent from the panel shell.
    pub async fn dispatch(&self, intent: PanelIntent) -> Result<IntentOutcome, AtlasError> {
        let outcome = match intent {
            PanelIntent::ToggleLayer { layer_id, enabled } => {
                IntentOutcome::Layer(layer_id, self.toggle_layer(layer_id, enabled).await?)
            }
            PanelIntent::ZoomToLayer(layer_id) => {
                IntentOutcome::Applied(self.registry.zoom_to(layer_id))
            }
            PanelIntent::SetLayerVisible { layer_id, visible } => {
                IntentOutcome::Applied(self.registry.set_visible(layer_id, visible))
            }
            PanelIntent::Toggle3d => IntentOutcome::Mode(self.toggle_3d()),
            PanelIntent::ToggleDarkMode => IntentOutcome::Mode(self.toggle_dark_mode()),
        };

        Ok(outcome)
    }

    /// Snapshot of the state rendered by the panel shell.
    pub fn panel(&self) -> LayerPanel {
        LayerPanel::snapshot(&self.registry, self.mode())
    }
}

/// Convenience type to initialize an [`Atlas`].
///
/// ```
/// use atlas::{AtlasBuilder, AtlasConfig};
/// use atlas::surface::MemoryEngine;
///
/// let atlas = AtlasBuilder::default()
///     .with_config(AtlasConfig::default().with_env_overrides())
///     .build(MemoryEngine::synchronous())
///     .expect("valid configuration");
/// ```
#[derive(Default)]
pub struct AtlasBuilder {
    config: Option<AtlasConfig>,
    provider: Option<Arc<dyn FeatureProvider>>,
    catalog: Option<Vec<Layer>>,
    messenger: Option<Arc<dyn Messenger>>,
}

impl AtlasBuilder {
    /// Sets the configuration. Defaults to [`AtlasConfig::default`].
    pub fn with_config(mut self, config: AtlasConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the REST provider built from the configuration.
    pub fn with_provider(mut self, provider: Arc<dyn FeatureProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sets the layer catalog, so [`Atlas::load_catalog`] does not need to be called.
    pub fn with_catalog(mut self, layers: Vec<Layer>) -> Self {
        self.catalog = Some(layers);
        self
    }

    /// Sets the receiver of layer and mode notifications.
    pub fn with_messenger(mut self, messenger: impl Messenger + 'static) -> Self {
        self.messenger = Some(Arc::new(messenger));
        self
    }

    /// Consumes the builder and creates the engine on top of the map engine.
    pub fn build<E: MapEngine + 'static>(self, engine: E) -> Result<Atlas, AtlasError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let provider = match self.provider {
            Some(provider) => provider,
            None => Arc::new(RestFeatureProvider::new(
                config.api_base_url.clone(),
                &config.user_agent,
            )?),
        };
        let messenger = self
            .messenger
            .unwrap_or_else(|| Arc::new(DummyMessenger));

        let surface = Surface::new(engine, config.styles.light.clone())
            .with_terrain_config(config.terrain.clone())
            .with_camera_config(config.camera.clone());
        let surface: SharedSurface = Arc::new(Mutex::new(surface));

        let loader =
            FeatureLoader::new(provider.clone(), config.request_timeout()).with_bbox(config.bbox);
        let registry = LayerRegistry::new(
            loader,
            surface.clone(),
            config.symbols,
            messenger.clone(),
            config.camera.fly_to_zoom,
        );
        if let Some(catalog) = self.catalog {
            registry.set_catalog(catalog);
        }

        let modes = ModeController::new(
            surface.clone(),
            config.styles.clone(),
            config.terrain.exaggeration,
            messenger,
        );

        info!("Map-layer engine created, feature service at {}", config.api_base_url);

        Ok(Atlas {
            config,
            provider,
            surface,
            registry,
            modes,
        })
    }
}
