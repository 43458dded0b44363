use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProcessInfo, SessionGeometry, SystemResources};

/// One tracked interview call, from start to stop.
///
/// Owned exclusively by the session controller for its lifetime; storage
/// adapters receive clones, never a live reference, so adapter-side
/// buffering cannot observe later mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Time-sortable unique id (UUID v7).
    pub session_id: String,
    /// Epoch milliseconds.
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_url: Option<String>,
    /// Count of events accepted for persistence. Monotonically
    /// non-decreasing; may exceed the rows actually retrievable after a
    /// sustained backend outage (loss, not corruption, is the degraded
    /// mode).
    pub total_events: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<SessionGeometry>,
    /// Latest filtered process snapshot, replaced wholesale on each poll.
    #[serde(default)]
    pub processes: Vec<ProcessInfo>,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_resources: Option<SystemResources>,
}

impl Session {
    pub fn new(call_url: Option<String>, start_time: i64) -> Self {
        Self {
            session_id: Uuid::now_v7().to_string(),
            start_time,
            end_time: None,
            call_url,
            total_events: 0,
            geometry: None,
            processes: Vec::new(),
            is_virtual: false,
            virtual_host: None,
            system_resources: None,
        }
    }

    /// Milliseconds between start and end; zero while the session is open.
    pub fn duration_ms(&self) -> i64 {
        self.end_time
            .map(|end| end - self.start_time)
            .unwrap_or(0)
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sessions_are_open_with_zero_events() {
        let session = Session::new(Some("https://meet.example.com/x".into()), 1_000);
        assert!(session.is_open());
        assert_eq!(session.total_events, 0);
        assert_eq!(session.duration_ms(), 0);
    }

    #[test]
    fn session_ids_are_unique_and_time_sortable() {
        let a = Session::new(None, 1);
        let b = Session::new(None, 2);
        assert_ne!(a.session_id, b.session_id);
        // UUID v7 embeds the timestamp in the most significant bits, so ids
        // generated later sort lexicographically after earlier ones.
        assert!(a.session_id < b.session_id);
    }

    #[test]
    fn serializes_camel_case_and_skips_absent_fields() {
        let session = Session::new(None, 42);
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("sessionId").is_some());
        assert!(json.get("startTime").is_some());
        assert!(json.get("endTime").is_none());
        assert!(json.get("callUrl").is_none());
        assert_eq!(json["totalEvents"], 0);
    }

    #[test]
    fn duration_uses_end_time_when_closed() {
        let mut session = Session::new(None, 1_000);
        session.end_time = Some(5_500);
        assert_eq!(session.duration_ms(), 4_500);
        assert!(!session.is_open());
    }
}
