//! The panel and toolbar shell of the map.
//!
//! The shell is a thin layer: it turns user intent into [`PanelIntent`]s, hands them to
//! [`Atlas::dispatch`](crate::Atlas::dispatch), and renders the [`LayerPanel`] snapshot. It never
//! touches the map surface or layer resources itself.

mod panel;

pub use panel::{LayerPanel, LayerRow, ToolbarState};

use crate::layer::{LayerId, LayerState};
use crate::mode::RenderMode;

/// User intent produced by the panel or toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelIntent {
    /// A layer checkbox changed.
    ToggleLayer {
        /// Layer of the checkbox.
        layer_id: LayerId,
        /// New checkbox value.
        enabled: bool,
    },
    /// "Zoom to layer" was clicked.
    ZoomToLayer(LayerId),
    /// The eye icon of an enabled layer changed.
    SetLayerVisible {
        /// Layer of the icon.
        layer_id: LayerId,
        /// New visibility.
        visible: bool,
    },
    /// The 3D button was clicked.
    Toggle3d,
    /// The dark mode button was clicked.
    ToggleDarkMode,
}

/// Result of a dispatched [`PanelIntent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOutcome {
    /// New state of the layer.
    Layer(LayerId, LayerState),
    /// Whether the intent had an effect on the map. False if the layer is not enabled.
    Applied(bool),
    /// New render mode.
    Mode(RenderMode),
}
