//! Host stub for embedding without a windowing runtime.

use vigil_core::host::{HostRuntime, HostWindow, PointerPosition};
use vigil_core::types::{ScreenGeometry, WindowGeometry};

/// A host that has no windows, displays or cursor. Used by the headless
/// `vigil track` binary, where process and environment telemetry are the
/// signal; input and geometry capture require a real host runtime
/// implementing [`HostRuntime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessHost;

impl HostRuntime for HeadlessHost {
    fn cursor_position(&self) -> Option<PointerPosition> {
        None
    }

    fn primary_display(&self) -> Option<ScreenGeometry> {
        None
    }

    fn display_count(&self) -> usize {
        0
    }

    fn window_alive(&self, _window: HostWindow) -> bool {
        false
    }

    fn window_geometry(&self, _window: HostWindow) -> Option<WindowGeometry> {
        None
    }
}
