use crate::layer::{Layer, LayerId, LayerRegistry, LayerState, LayerType};
use crate::mode::RenderMode;

/// One row of the layer panel.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRow {
    /// Layer id.
    pub id: LayerId,
    /// Display name.
    pub name: String,
    /// Declared geometry type, used for the row icon.
    pub layer_type: LayerType,
    /// Description shown under the name.
    pub description: Option<String>,
    /// Layer state.
    pub state: LayerState,
    /// Whether the user wants the layer on. Differs from `state` while the layer is loading.
    pub checked: bool,
    /// Message of the last failed enable attempt.
    pub error: Option<String>,
}

impl LayerRow {
    /// Checkbox value. A layer switched off while loading shows as unchecked right away.
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Whether a spinner should be shown.
    pub fn is_loading(&self) -> bool {
        self.state == LayerState::Pending
    }
}

/// Button states of the toolbar.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ToolbarState {
    /// 3D button is pressed.
    pub is_3d: bool,
    /// Dark mode button is pressed.
    pub is_dark: bool,
}

impl From<RenderMode> for ToolbarState {
    fn from(mode: RenderMode) -> Self {
        Self {
            is_3d: mode.is_3d,
            is_dark: mode.is_dark,
        }
    }
}

/// Snapshot of everything the panel shell renders.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerPanel {
    /// Catalog rows in catalog order.
    pub rows: Vec<LayerRow>,
    /// Toolbar buttons.
    pub toolbar: ToolbarState,
}

impl LayerPanel {
    /// Reads the current registry and mode state.
    pub fn snapshot(registry: &LayerRegistry, mode: RenderMode) -> Self {
        let rows = registry
            .layers()
            .into_iter()
            .map(|layer| row(registry, layer))
            .collect();

        Self {
            rows,
            toolbar: mode.into(),
        }
    }

    /// Row of the layer.
    pub fn row(&self, layer_id: LayerId) -> Option<&LayerRow> {
        self.rows.iter().find(|row| row.id == layer_id)
    }

    /// Number of layers currently on the map.
    pub fn enabled_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.state == LayerState::Enabled)
            .count()
    }
}

fn row(registry: &LayerRegistry, layer: Layer) -> LayerRow {
    LayerRow {
        id: layer.id,
        state: registry.state(layer.id),
        checked: registry.is_desired(layer.id),
        error: registry.last_error(layer.id).map(|err| err.to_string()),
        name: layer.name,
        layer_type: layer.layer_type,
        description: layer.description,
    }
}
