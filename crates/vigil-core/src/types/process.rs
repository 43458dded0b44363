use serde::{Deserialize, Serialize};

/// Raw process-table entry as enumerated from the OS, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProcess {
    pub name: String,
    pub cmd: String,
    pub bin: Option<String>,
}

/// A classified process-table entry. Recomputed every poll; a poll always
/// produces a fresh set, entries are never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInfo {
    pub name: String,
    pub cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<String>,
    pub is_suspicious: bool,
    pub is_application: bool,
}

impl ProcessInfo {
    /// Snapshot sort key: doubly-flagged entries first.
    pub fn priority(&self) -> u8 {
        self.is_suspicious as u8 + self.is_application as u8
    }
}
