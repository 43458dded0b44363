//! Networked storage adapter with in-memory batching and at-least-once
//! delivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use vigil_core::config::StorageConfig;
use vigil_core::types::{ActivityEvent, Session};

use crate::adapter::{StorageAdapter, StoreError, StoreResult};
use crate::batcher::{EventBatcher, PendingEvent};
use crate::rest::{RemoteApi, RestApi};
use crate::rows::{ActivityRow, SessionRow};

pub struct RemoteAdapter {
    inner: Arc<Inner>,
}

struct Inner {
    api: Box<dyn RemoteApi>,
    batcher: Mutex<EventBatcher>,
    batch_timeout: Duration,
    flush_scheduled: AtomicBool,
    initialized: AtomicBool,
}

impl RemoteAdapter {
    pub fn new(base_url: &str, api_key: &str, config: &StorageConfig) -> Self {
        Self::with_api(
            Box::new(RestApi::new(base_url, api_key)),
            config.batch_size,
            Duration::from_millis(config.batch_timeout_ms),
            config.max_buffered_events,
        )
    }

    /// Construct over an arbitrary transport. Tests inject mocks here.
    pub fn with_api(
        api: Box<dyn RemoteApi>,
        batch_size: usize,
        batch_timeout: Duration,
        max_buffered: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                batcher: Mutex::new(EventBatcher::new(batch_size, max_buffered)),
                batch_timeout,
                flush_scheduled: AtomicBool::new(false),
                initialized: AtomicBool::new(false),
            }),
        }
    }

    fn ensure_initialized(&self) -> StoreResult<()> {
        if self.inner.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    /// Arm the deadline flush if no flush is already pending. The timer
    /// fires once; a failed flush waits for the next natural trigger
    /// rather than looping inline.
    fn schedule_flush(&self) {
        if self.inner.flush_scheduled.swap(true, Ordering::AcqRel) {
            return;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.batch_timeout).await;
            inner.flush_scheduled.store(false, Ordering::Release);
            if let Err(err) = Inner::flush(&inner).await {
                warn!("scheduled batch flush failed, batch requeued: {err}");
            }
        });
    }
}

impl Inner {
    /// Flush everything currently buffered in one backend write. On
    /// failure the batch goes back to the front of the buffer.
    async fn flush(inner: &Arc<Inner>) -> StoreResult<()> {
        let batch = {
            let mut batcher = inner.batcher.lock().expect("batcher lock poisoned");
            let dropped = batcher.dropped_total();
            if dropped > 0 {
                debug!(dropped, "event buffer has dropped oldest entries to its cap");
            }
            batcher.take_all()
        };
        if batch.is_empty() {
            return Ok(());
        }

        let rows: StoreResult<Vec<ActivityRow>> = batch
            .iter()
            .map(|p| ActivityRow::from_event(&p.session_id, &p.event))
            .collect();
        let rows = match rows {
            Ok(rows) => rows,
            Err(err) => {
                inner
                    .batcher
                    .lock()
                    .expect("batcher lock poisoned")
                    .requeue_front(batch);
                return Err(err);
            }
        };

        let count = rows.len();
        match inner.api.insert_events(rows).await {
            Ok(()) => {
                debug!(count, "flushed event batch");
                Ok(())
            }
            Err(err) => {
                inner
                    .batcher
                    .lock()
                    .expect("batcher lock poisoned")
                    .requeue_front(batch);
                Err(err)
            }
        }
    }
}

#[async_trait]
impl StorageAdapter for RemoteAdapter {
    async fn initialize(&self) -> StoreResult<()> {
        self.inner.api.ping().await?;
        self.inner.initialized.store(true, Ordering::Release);
        Ok(())
    }

    async fn create_session(&self, session: Session) -> StoreResult<()> {
        self.ensure_initialized()?;
        let row = SessionRow::from_session(&session);
        self.inner.api.insert_session(row).await
    }

    async fn update_session(&self, session: Session) -> StoreResult<()> {
        self.ensure_initialized()?;
        let mut row = SessionRow::from_session(&session);
        row.updated_at = Some(Utc::now().to_rfc3339());
        self.inner.api.update_session(&session.session_id, row).await
    }

    async fn save_event(&self, session_id: &str, event: ActivityEvent) -> StoreResult<()> {
        self.ensure_initialized()?;

        let full = {
            let mut batcher = self.inner.batcher.lock().expect("batcher lock poisoned");
            batcher.push(PendingEvent {
                session_id: session_id.to_string(),
                event,
            });
            batcher.is_full_batch()
        };

        if full {
            Inner::flush(&self.inner).await
        } else {
            self.schedule_flush();
            Ok(())
        }
    }

    async fn get_sessions_by_call_url(&self, call_url: &str) -> StoreResult<Vec<Session>> {
        self.ensure_initialized()?;
        let rows = self.inner.api.list_sessions(call_url).await?;
        Ok(rows.into_iter().map(SessionRow::into_session).collect())
    }

    async fn get_session_with_events(
        &self,
        session_id: &str,
    ) -> StoreResult<(Session, Vec<ActivityEvent>)> {
        self.ensure_initialized()?;
        let session = self
            .inner
            .api
            .fetch_session(session_id)
            .await?
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?
            .into_session();
        let events = self
            .inner
            .api
            .fetch_events(session_id)
            .await?
            .into_iter()
            .map(ActivityRow::into_event)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((session, events))
    }

    async fn destroy(&self) -> StoreResult<()> {
        Inner::flush(&self.inner).await
    }

    fn is_ready(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    fn pending_events(&self) -> usize {
        self.inner.batcher.lock().expect("batcher lock poisoned").len()
    }
}
