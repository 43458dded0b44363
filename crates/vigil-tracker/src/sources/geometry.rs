//! Periodic geometry refresh for the monitored window.

use std::sync::Arc;

use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use vigil_core::host;

use crate::controller::ControllerInner;

pub(crate) async fn run(inner: Arc<ControllerInner>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(Duration::from_millis(
        inner.capture.geometry_interval_ms.max(1),
    ));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let window = inner.target_window();
                // No-op once the handle goes stale; querying a destroyed
                // window is the failure mode this guards against.
                let Some(geometry) = host::session_geometry(inner.host.as_ref(), window) else {
                    continue;
                };
                let updated = inner.with_session(|session| {
                    session.geometry = Some(geometry.clone());
                });
                if let Some(session) = updated {
                    inner.push_session_update(session).await;
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
}
