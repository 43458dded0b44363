//! Append-only local file adapter: a whole-session JSON snapshot plus a
//! line-delimited event log, mirrored into an in-memory index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use vigil_core::types::{ActivityEvent, Session};

use crate::adapter::{StorageAdapter, StoreError, StoreResult};

/// One line of the event log.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogLine {
    session_id: String,
    event: ActivityEvent,
    /// Wall-clock write time, RFC 3339.
    timestamp: String,
}

/// The snapshot document: the session plus bookkeeping fields the viewer
/// reads without replaying the log.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotDoc<'a> {
    #[serde(flatten)]
    session: &'a Session,
    saved_at: String,
    duration: i64,
    platform: &'static str,
    app_version: &'static str,
}

#[derive(Default)]
struct LocalIndex {
    sessions: HashMap<String, Session>,
    events: HashMap<String, Vec<ActivityEvent>>,
    by_call_url: HashMap<String, Vec<String>>,
}

impl LocalIndex {
    fn index_call_url(&mut self, session: &Session) {
        if let Some(url) = &session.call_url {
            let ids = self.by_call_url.entry(url.clone()).or_default();
            if !ids.contains(&session.session_id) {
                ids.push(session.session_id.clone());
            }
        }
    }

    fn unindex_call_url(&mut self, url: &str, session_id: &str) {
        if let Some(ids) = self.by_call_url.get_mut(url) {
            ids.retain(|id| id != session_id);
            if ids.is_empty() {
                self.by_call_url.remove(url);
            }
        }
    }
}

pub struct LocalAdapter {
    snapshot_path: PathBuf,
    log_path: PathBuf,
    initialized: AtomicBool,
    index: Mutex<LocalIndex>,
}

impl LocalAdapter {
    /// `snapshot_path` holds the latest session document; the event log is
    /// the same path with its extension replaced by `.jsonl`.
    pub fn new(snapshot_path: impl AsRef<Path>) -> Self {
        let snapshot_path = snapshot_path.as_ref().to_path_buf();
        let log_path = snapshot_path.with_extension("jsonl");
        Self {
            snapshot_path,
            log_path,
            initialized: AtomicBool::new(false),
            index: Mutex::new(LocalIndex::default()),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    fn ensure_initialized(&self) -> StoreResult<()> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    async fn load_sessions(&self, index: &mut LocalIndex) {
        let raw = match tokio::fs::read_to_string(&self.snapshot_path).await {
            Ok(raw) => raw,
            Err(_) => {
                info!("no existing session snapshot, starting fresh");
                return;
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!("session snapshot unreadable, starting fresh: {err}");
                return;
            }
        };

        // The file normally holds one session document, but a list is
        // accepted too.
        let docs = match value {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };
        for doc in docs {
            match serde_json::from_value::<Session>(doc) {
                Ok(session) => {
                    index.index_call_url(&session);
                    index.events.entry(session.session_id.clone()).or_default();
                    index.sessions.insert(session.session_id.clone(), session);
                }
                Err(err) => warn!("skipping unreadable session document: {err}"),
            }
        }
    }

    async fn load_events(&self, index: &mut LocalIndex) {
        let raw = match tokio::fs::read_to_string(&self.log_path).await {
            Ok(raw) => raw,
            Err(_) => {
                info!("no existing event log, starting fresh");
                return;
            }
        };

        let mut skipped = 0usize;
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogLine>(line) {
                Ok(entry) => index
                    .events
                    .entry(entry.session_id)
                    .or_default()
                    .push(entry.event),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, "skipped corrupt event log lines");
        }
    }

    async fn write_snapshot(&self, session: &Session) -> StoreResult<()> {
        let doc = SnapshotDoc {
            session,
            saved_at: Utc::now().to_rfc3339(),
            duration: session.duration_ms(),
            platform: std::env::consts::OS,
            app_version: env!("CARGO_PKG_VERSION"),
        };
        let json = serde_json::to_string_pretty(&doc)?;

        if let Some(parent) = self.snapshot_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.snapshot_path, json).await?;
        Ok(())
    }

    async fn append_log_line(&self, session_id: &str, event: &ActivityEvent) -> StoreResult<()> {
        let entry = LogLine {
            session_id: session_id.to_string(),
            event: event.clone(),
            timestamp: Utc::now().to_rfc3339(),
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for LocalAdapter {
    async fn initialize(&self) -> StoreResult<()> {
        let mut index = self.index.lock().await;
        *index = LocalIndex::default();
        self.load_sessions(&mut index).await;
        self.load_events(&mut index).await;
        debug!(
            sessions = index.sessions.len(),
            "local storage adapter initialized"
        );
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    async fn create_session(&self, session: Session) -> StoreResult<()> {
        self.ensure_initialized()?;
        let mut index = self.index.lock().await;
        index.index_call_url(&session);
        index.events.entry(session.session_id.clone()).or_default();
        index.sessions.insert(session.session_id.clone(), session.clone());
        self.write_snapshot(&session).await
    }

    async fn update_session(&self, session: Session) -> StoreResult<()> {
        self.ensure_initialized()?;
        let mut index = self.index.lock().await;
        let previous = index
            .sessions
            .get(&session.session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session.session_id.clone()))?
            .clone();

        if previous.call_url != session.call_url {
            if let Some(url) = &previous.call_url {
                let id = session.session_id.clone();
                index.unindex_call_url(url, &id);
            }
            index.index_call_url(&session);
        }

        index.sessions.insert(session.session_id.clone(), session.clone());
        self.write_snapshot(&session).await
    }

    async fn save_event(&self, session_id: &str, event: ActivityEvent) -> StoreResult<()> {
        self.ensure_initialized()?;
        let mut index = self.index.lock().await;
        index
            .events
            .entry(session_id.to_string())
            .or_default()
            .push(event.clone());
        if let Some(session) = index.sessions.get_mut(session_id) {
            session.total_events += 1;
        }
        self.append_log_line(session_id, &event).await
    }

    async fn get_sessions_by_call_url(&self, call_url: &str) -> StoreResult<Vec<Session>> {
        self.ensure_initialized()?;
        let index = self.index.lock().await;
        let mut sessions: Vec<Session> = index
            .by_call_url
            .get(call_url)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| index.sessions.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(sessions)
    }

    async fn get_session_with_events(
        &self,
        session_id: &str,
    ) -> StoreResult<(Session, Vec<ActivityEvent>)> {
        self.ensure_initialized()?;
        let index = self.index.lock().await;
        let session = index
            .sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        let events = index.events.get(session_id).cloned().unwrap_or_default();
        Ok((session, events))
    }

    async fn destroy(&self) -> StoreResult<()> {
        let index = self.index.lock().await;
        // Latest session wins the snapshot file, same as during tracking.
        if let Some(latest) = index.sessions.values().max_by_key(|s| s.start_time) {
            self.write_snapshot(latest).await?;
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }
}
