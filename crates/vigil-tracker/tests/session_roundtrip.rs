//! End-to-end: a tracked session recorded through the local adapter
//! survives a process restart with its events in capture order.

use std::sync::Arc;

use vigil_core::config::{CaptureConfig, ProcessConfig};
use vigil_core::types::{KeyComboData, MouseButton};
use vigil_store::{LocalAdapter, StorageAdapter};
use vigil_tracker::{HeadlessHost, SessionController};

/// Pollers tick once immediately and then effectively never again, so the
/// recorded stream is exactly what the test submits.
fn quiet_capture() -> CaptureConfig {
    CaptureConfig {
        pointer_interval_ms: 3_600_000,
        idle_check_interval_ms: 3_600_000,
        idle_threshold_ms: 3_600_000,
        geometry_interval_ms: 3_600_000,
        process_interval_ms: 3_600_000,
        queue_capacity: 512,
    }
}

#[tokio::test]
async fn session_survives_restart_with_ordered_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activity-session.json");
    let call_url = "https://meet.example.com/final-round";

    let session_id = {
        let adapter: Arc<dyn StorageAdapter> = Arc::new(LocalAdapter::new(&path));
        adapter.initialize().await.unwrap();

        let controller = SessionController::new(
            Arc::new(HeadlessHost),
            Arc::clone(&adapter),
            quiet_capture(),
            ProcessConfig::default(),
        );

        controller
            .start(Some(call_url.to_string()), None, None)
            .await
            .unwrap();
        let session_id = controller.current_session().unwrap().session_id;

        controller.record_mouse_click(10, 20, MouseButton::Left);
        controller.record_key_down(KeyComboData {
            code: "KeyC".into(),
            shift: false,
            ctrl: true,
            alt: false,
            meta: false,
        });
        controller.record_page_navigation(call_url.to_string(), Some("Interview".into()));

        controller.stop().await;
        adapter.destroy().await.unwrap();
        session_id
    };

    // Restart: a fresh adapter over the same files rebuilds the index.
    let reopened = LocalAdapter::new(&path);
    reopened.initialize().await.unwrap();

    let (session, events) = reopened.get_session_with_events(&session_id).await.unwrap();

    assert_eq!(session.call_url.as_deref(), Some(call_url));
    assert!(session.end_time.is_some());
    // Geometry was never available (headless host), so none was stored.
    assert!(session.geometry.is_none());

    // app_open, click, key combo, navigation, app_blur, app_close.
    let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        types,
        vec![
            "app_open",
            "mouse_click",
            "key_down",
            "page_navigate",
            "app_blur",
            "app_close"
        ]
    );
    assert_eq!(session.total_events, events.len() as u64);

    // Timestamps never run backwards within the single capture stream.
    for pair in events.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }

    let listed = reopened.get_sessions_by_call_url(call_url).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].session_id, session_id);
}
