//! Session lifecycle and event fan-in.
//!
//! The controller is the single authority for "is tracking active". All
//! sources — the periodic pollers it spawns and the discrete host/webview
//! signals pushed into it — funnel through one bounded queue into a single
//! persistence worker, so capture is never blocked on storage and events
//! from one source keep their capture order.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vigil_core::config::{CaptureConfig, ProcessConfig};
use vigil_core::host::{self, HostRuntime, HostWindow};
use vigil_core::keys;
use vigil_core::types::{
    ActivityEvent, EventKind, KeyComboData, MouseButton, MouseClickData, PageNavigateData, Session,
    VmDetection,
};
use vigil_store::{StorageAdapter, StoreResult};

use crate::sources;

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// State machine: Idle → Tracking → Idle. Start and stop are idempotent;
/// events submitted while Idle are silently ignored.
pub struct SessionController {
    inner: Arc<ControllerInner>,
    /// Running task handles, present only while Tracking.
    tasks: tokio::sync::Mutex<Option<RunningTasks>>,
}

struct RunningTasks {
    sources_cancel: CancellationToken,
    worker_cancel: CancellationToken,
    source_handles: Vec<JoinHandle<()>>,
    worker_handle: JoinHandle<()>,
}

pub(crate) struct ControllerInner {
    pub(crate) host: Arc<dyn HostRuntime>,
    pub(crate) storage: Arc<dyn StorageAdapter>,
    pub(crate) capture: CaptureConfig,
    pub(crate) process: ProcessConfig,
    state: Mutex<ControllerState>,
}

#[derive(Default)]
struct ControllerState {
    tracking: bool,
    session: Option<Session>,
    window: Option<HostWindow>,
    app_focused: bool,
    app_visible: bool,
    last_key: Option<KeyComboData>,
    last_activity_ms: i64,
    idle: bool,
    tx: Option<mpsc::Sender<ActivityEvent>>,
}

impl ControllerInner {
    fn lock(&self) -> std::sync::MutexGuard<'_, ControllerState> {
        self.state.lock().expect("controller state lock poisoned")
    }

    /// Queue one event for persistence. No-op when Idle; a full queue
    /// drops the event rather than stalling the capture path.
    pub(crate) fn emit(&self, kind: EventKind) {
        let event = ActivityEvent::new(now_ms(), kind);
        let tx = {
            let state = self.lock();
            if !state.tracking {
                return;
            }
            state.tx.clone()
        };
        let Some(tx) = tx else { return };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(kind = event.event_type(), "capture queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("capture queue closed, event discarded");
            }
        }
    }

    /// Register input activity for idle detection.
    pub(crate) fn touch_activity(&self) {
        self.lock().last_activity_ms = now_ms();
    }

    pub(crate) fn target_window(&self) -> Option<HostWindow> {
        self.lock().window
    }

    /// Milliseconds since the last input, plus the current idle flag.
    pub(crate) fn idle_snapshot(&self) -> (i64, bool) {
        let state = self.lock();
        (now_ms() - state.last_activity_ms, state.idle)
    }

    pub(crate) fn set_idle(&self, idle: bool) {
        self.lock().idle = idle;
    }

    /// Mutate the live session and hand back a clone for persistence.
    pub(crate) fn with_session(&self, apply: impl FnOnce(&mut Session)) -> Option<Session> {
        let mut state = self.lock();
        state.session.as_mut().map(|session| {
            apply(session);
            session.clone()
        })
    }

    pub(crate) async fn push_session_update(&self, session: Session) {
        let session_id = session.session_id.clone();
        if let Err(err) = self.storage.update_session(session).await {
            warn!(session_id, "failed to update session: {err}");
        }
    }
}

/// Single consumer of the capture queue. Owns the event counter so
/// `total_events` equals exactly the events accepted for persistence.
async fn persistence_worker(
    inner: Arc<ControllerInner>,
    mut rx: mpsc::Receiver<ActivityEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => persist_one(&inner, event).await,
                None => break,
            },
            _ = cancel.cancelled() => {
                // Drain what capture already enqueued so the counter and
                // the shutdown event pair survive into the final update.
                while let Ok(event) = rx.try_recv() {
                    persist_one(&inner, event).await;
                }
                break;
            }
        }
    }
}

async fn persist_one(inner: &ControllerInner, event: ActivityEvent) {
    let session_id = {
        let mut state = inner.lock();
        match state.session.as_mut() {
            Some(session) => {
                session.total_events += 1;
                session.session_id.clone()
            }
            None => return,
        }
    };
    // Fire-and-forget intent: a storage failure is logged, never surfaced
    // back to the capture loops.
    if let Err(err) = inner.storage.save_event(&session_id, event).await {
        warn!(session_id, "failed to persist event: {err}");
    }
}

impl SessionController {
    pub fn new(
        host: Arc<dyn HostRuntime>,
        storage: Arc<dyn StorageAdapter>,
        capture: CaptureConfig,
        process: ProcessConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                host,
                storage,
                capture,
                process,
                state: Mutex::new(ControllerState::default()),
            }),
            tasks: tokio::sync::Mutex::new(None),
        }
    }

    /// Begin a tracked session. Idempotent: a second call while Tracking
    /// is a logged no-op. On storage failure the controller stays Idle.
    pub async fn start(
        &self,
        call_url: Option<String>,
        window: Option<HostWindow>,
        environment: Option<VmDetection>,
    ) -> StoreResult<()> {
        let mut tasks_slot = self.tasks.lock().await;
        if self.inner.lock().tracking {
            info!("tracking already active");
            return Ok(());
        }

        let started_at = now_ms();
        let mut session = Session::new(call_url, started_at);
        session.geometry = host::session_geometry(self.inner.host.as_ref(), window);
        if let Some(env) = environment {
            session.is_virtual = env.is_virtual;
            session.virtual_host = env.virtual_host;
            session.system_resources = env.system_resources;
        }
        let session_id = session.session_id.clone();

        // The session row must exist before any event referencing it.
        self.inner.storage.create_session(session.clone()).await?;

        let (tx, rx) = mpsc::channel(self.inner.capture.queue_capacity.max(1));
        {
            let mut state = self.inner.lock();
            state.tracking = true;
            state.session = Some(session);
            state.window = window;
            state.app_focused = false;
            state.app_visible = true;
            state.last_key = None;
            state.idle = false;
            state.last_activity_ms = started_at;
            state.tx = Some(tx);
        }

        let sources_cancel = CancellationToken::new();
        let worker_cancel = CancellationToken::new();
        let worker_handle = tokio::spawn(persistence_worker(
            Arc::clone(&self.inner),
            rx,
            worker_cancel.clone(),
        ));
        let source_handles = vec![
            tokio::spawn(sources::pointer::run(
                Arc::clone(&self.inner),
                sources_cancel.clone(),
            )),
            tokio::spawn(sources::idle::run(
                Arc::clone(&self.inner),
                sources_cancel.clone(),
            )),
            tokio::spawn(sources::geometry::run(
                Arc::clone(&self.inner),
                sources_cancel.clone(),
            )),
            tokio::spawn(sources::process::run(
                Arc::clone(&self.inner),
                sources_cancel.clone(),
            )),
        ];
        *tasks_slot = Some(RunningTasks {
            sources_cancel,
            worker_cancel,
            source_handles,
            worker_handle,
        });

        self.inner.emit(EventKind::AppOpen {});
        info!(session_id, "activity tracking started");
        Ok(())
    }

    /// End the session: emit the blur/close pair, cancel every poller,
    /// drain the queue, finalize geometry and persist the end time.
    /// No-op when Idle.
    pub async fn stop(&self) {
        let mut tasks_slot = self.tasks.lock().await;
        if !self.inner.lock().tracking {
            return;
        }

        // Blur strictly before close; the yield lets any event already
        // scheduled this tick enqueue in between instead of after close.
        self.inner.emit(EventKind::AppBlur {});
        tokio::task::yield_now().await;
        self.inner.emit(EventKind::AppClose {});

        self.inner.lock().tracking = false;

        if let Some(tasks) = tasks_slot.take() {
            tasks.sources_cancel.cancel();
            for handle in tasks.source_handles {
                let _ = handle.await;
            }
            tasks.worker_cancel.cancel();
            let _ = tasks.worker_handle.await;
        }

        let finalized = {
            let mut state = self.inner.lock();
            state.tx = None;
            state.window = None;
            state.last_key = None;
            state.session.take().map(|mut session| {
                session.end_time = Some(now_ms());
                if let Some(geometry) = session.geometry.as_mut() {
                    geometry.window.is_visible = false;
                    geometry.window.is_focused = false;
                }
                session
            })
        };

        if let Some(session) = finalized {
            let session_id = session.session_id.clone();
            let total_events = session.total_events;
            if let Err(err) = self.inner.storage.update_session(session).await {
                warn!(session_id, "failed to finalize session: {err}");
            }
            info!(session_id, total_events, "activity tracking stopped");
        }
    }

    /// Submit an already-built event. Silently ignored when Idle.
    pub fn add_event(&self, kind: EventKind) {
        self.inner.emit(kind);
    }

    pub fn record_mouse_click(&self, x: i32, y: i32, button: MouseButton) {
        self.inner.touch_activity();
        self.inner.emit(EventKind::MouseClick(MouseClickData { x, y, button }));
    }

    /// Forward a key-down if it is a combination and differs from the
    /// previously forwarded one; key-repeat floods collapse to one event.
    pub fn record_key_down(&self, combo: KeyComboData) {
        self.inner.touch_activity();
        if !keys::is_key_combination(&combo) {
            return;
        }
        {
            let mut state = self.inner.lock();
            if !state.tracking {
                return;
            }
            if state
                .last_key
                .as_ref()
                .is_some_and(|last| keys::same_combination(last, &combo))
            {
                return;
            }
            state.last_key = Some(combo.clone());
        }
        self.inner.emit(EventKind::KeyDown(combo));
    }

    pub fn record_page_navigation(&self, url: String, title: Option<String>) {
        self.inner.emit(EventKind::PageNavigate(PageNavigateData { url, title }));
    }

    pub fn record_screenshot_attempt(&self) {
        self.inner.emit(EventKind::ScreenshotAttempt {});
    }

    /// Edge-detected host focus signal: repeated reports of the same state
    /// emit nothing.
    pub fn host_focus_changed(&self, focused: bool) {
        let transition = {
            let mut state = self.inner.lock();
            if state.app_focused == focused {
                None
            } else {
                state.app_focused = focused;
                Some(focused)
            }
        };
        match transition {
            Some(true) => self.inner.emit(EventKind::AppFocus {}),
            Some(false) => self.inner.emit(EventKind::AppBlur {}),
            None => {}
        }
    }

    /// Edge-detected host visibility signal.
    pub fn host_visibility_changed(&self, visible: bool) {
        let transition = {
            let mut state = self.inner.lock();
            if state.app_visible == visible {
                None
            } else {
                state.app_visible = visible;
                Some(visible)
            }
        };
        match transition {
            Some(true) => self.inner.emit(EventKind::AppShow {}),
            Some(false) => self.inner.emit(EventKind::AppHide {}),
            None => {}
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.inner.lock().tracking
    }

    /// Snapshot of the live session, if any.
    pub fn current_session(&self) -> Option<Session> {
        self.inner.lock().session.clone()
    }
}
