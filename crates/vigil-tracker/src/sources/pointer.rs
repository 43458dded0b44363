//! Pointer-position poller.

use std::sync::Arc;

use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use vigil_core::host::PointerPosition;
use vigil_core::types::{EventKind, MouseMoveData};

use crate::controller::ControllerInner;

pub(crate) async fn run(inner: Arc<ControllerInner>, cancel: CancellationToken) {
    let mut ticker =
        tokio::time::interval(Duration::from_millis(inner.capture.pointer_interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_position: Option<PointerPosition> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A host that cannot report the cursor (missing
                // accessibility permission, headless embed) skips the tick.
                let Some(position) = inner.host.cursor_position() else {
                    continue;
                };
                if last_position != Some(position) {
                    inner.touch_activity();
                }
                last_position = Some(position);
                inner.emit(EventKind::MouseMove(MouseMoveData {
                    x: position.x,
                    y: position.y,
                }));
            }
            _ = cancel.cancelled() => break,
        }
    }
}
