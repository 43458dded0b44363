//! Boundary to the windowing/host runtime.
//!
//! The host runtime (the thing that actually owns windows, displays and the
//! cursor) lives outside this workspace; capture code talks to it through
//! [`HostRuntime`]. Discrete signals — focus changes, clicks, key-downs,
//! navigations, screenshot shortcuts — are pushed by the host into the
//! session controller and do not appear here.

use crate::types::{ScreenGeometry, SessionGeometry, WindowGeometry};

/// Opaque handle to a host window. Handles can outlive the window they
/// refer to; `window_alive` must be checked before geometry queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostWindow(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

pub trait HostRuntime: Send + Sync + 'static {
    /// Current cursor position in screen coordinates, if the host can
    /// report it (permission problems return None, never block).
    fn cursor_position(&self) -> Option<PointerPosition>;

    fn primary_display(&self) -> Option<ScreenGeometry>;

    fn display_count(&self) -> usize;

    /// Whether the handle still refers to a live window.
    fn window_alive(&self, window: HostWindow) -> bool;

    fn window_geometry(&self, window: HostWindow) -> Option<WindowGeometry>;
}

/// Capture the full session geometry, or None when there is no live target
/// window — querying a destroyed window is the classic crash here, so the
/// liveness check comes first.
pub fn session_geometry(
    host: &dyn HostRuntime,
    window: Option<HostWindow>,
) -> Option<SessionGeometry> {
    let window = window?;
    if !host.window_alive(window) {
        return None;
    }
    let screen = host.primary_display()?;
    let window = host.window_geometry(window)?;
    Some(SessionGeometry {
        screen,
        window,
        display_count: host.display_count().max(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Host double with a single 1920x1080 display and one optional window.
    struct FixedHost {
        window_alive: bool,
    }

    impl HostRuntime for FixedHost {
        fn cursor_position(&self) -> Option<PointerPosition> {
            Some(PointerPosition { x: 5, y: 7 })
        }

        fn primary_display(&self) -> Option<ScreenGeometry> {
            Some(ScreenGeometry {
                width: 1920,
                height: 1080,
                scale_factor: 2.0,
            })
        }

        fn display_count(&self) -> usize {
            0 // some hosts report zero displays during teardown
        }

        fn window_alive(&self, _window: HostWindow) -> bool {
            self.window_alive
        }

        fn window_geometry(&self, _window: HostWindow) -> Option<WindowGeometry> {
            Some(WindowGeometry {
                x: 100,
                y: 50,
                width: 1200,
                height: 800,
                is_visible: true,
                is_focused: true,
            })
        }
    }

    #[test]
    fn geometry_requires_a_live_window() {
        let host = FixedHost { window_alive: false };
        assert!(session_geometry(&host, Some(HostWindow(1))).is_none());
        assert!(session_geometry(&host, None).is_none());
    }

    #[test]
    fn geometry_combines_screen_window_and_display_count() {
        let host = FixedHost { window_alive: true };
        let geometry = session_geometry(&host, Some(HostWindow(1))).unwrap();
        assert_eq!(geometry.screen.width, 1920);
        assert_eq!(geometry.window.x, 100);
        // Display count is clamped to at least one.
        assert_eq!(geometry.display_count, 1);
    }
}
