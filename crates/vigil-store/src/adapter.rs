use async_trait::async_trait;
use thiserror::Error;

use vigil_core::types::{ActivityEvent, Session};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or malformed connection info. Fatal to the factory caller.
    #[error("storage configuration invalid: {0}")]
    Configuration(String),

    /// Transient backend failure. Triggers fallback at startup or batch
    /// retry at runtime, never fatal to `save_event` callers.
    #[error("storage backend unreachable: {0}")]
    Connectivity(String),

    /// Programmer error: an operation before `initialize()` succeeded.
    #[error("storage adapter used before initialize()")]
    NotInitialized,

    #[error("session {0} not found")]
    SessionNotFound(String),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable recording of session metadata and events.
///
/// Sessions arrive by value — adapters own their copy and must not expect
/// to observe later controller-side mutations. `save_event` is
/// at-least-once: a transient failure retries rather than dropping, so
/// consumers must tolerate duplicates.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    async fn initialize(&self) -> StoreResult<()>;

    /// One immediate write; the session row must exist before any event
    /// referencing it is flushed.
    async fn create_session(&self, session: Session) -> StoreResult<()>;

    async fn update_session(&self, session: Session) -> StoreResult<()>;

    async fn save_event(&self, session_id: &str, event: ActivityEvent) -> StoreResult<()>;

    /// Session metadata for a call url, newest first.
    async fn get_sessions_by_call_url(&self, call_url: &str) -> StoreResult<Vec<Session>>;

    /// One session plus its full ordered event list.
    async fn get_session_with_events(
        &self,
        session_id: &str,
    ) -> StoreResult<(Session, Vec<ActivityEvent>)>;

    /// Shut down without silently dropping buffered data.
    async fn destroy(&self) -> StoreResult<()>;

    fn is_ready(&self) -> bool;

    /// Events buffered but not yet durably written.
    fn pending_events(&self) -> usize {
        0
    }
}
