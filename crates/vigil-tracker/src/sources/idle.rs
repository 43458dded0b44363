//! Idle-state edge detection over the controller's last-activity clock.

use std::sync::Arc;

use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use vigil_core::types::{EventKind, IdleData};

use crate::controller::ControllerInner;

pub(crate) async fn run(inner: Arc<ControllerInner>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(Duration::from_millis(
        inner.capture.idle_check_interval_ms.max(1),
    ));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let threshold = inner.capture.idle_threshold_ms as i64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (since_activity, was_idle) = inner.idle_snapshot();
                if since_activity > threshold && !was_idle {
                    inner.set_idle(true);
                    inner.emit(EventKind::IdleStart(IdleData {
                        idle_duration: since_activity,
                    }));
                } else if since_activity <= threshold && was_idle {
                    inner.set_idle(false);
                    inner.emit(EventKind::IdleEnd(IdleData {
                        idle_duration: since_activity,
                    }));
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
}
