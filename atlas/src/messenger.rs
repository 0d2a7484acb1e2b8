use crate::layer::{LayerId, LayerState};
use crate::mode::RenderMode;

/// Receives notifications about state the panel shell renders: layer toggles and render modes.
///
/// Notifications are sent after the state is committed, so reading the registry from inside a
/// callback returns the new state.
pub trait Messenger: Send + Sync {
    /// A layer moved to a new state.
    fn layer_state_changed(&self, layer_id: LayerId, state: LayerState);
    /// 3D or dark mode was toggled.
    fn render_mode_changed(&self, _mode: RenderMode) {}
}

/// Messenger that ignores all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyMessenger;

impl Messenger for DummyMessenger {
    fn layer_state_changed(&self, _layer_id: LayerId, _state: LayerState) {}
}
