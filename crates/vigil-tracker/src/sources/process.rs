//! Process-table poller: enumerate, classify, diff, snapshot.
//!
//! The scan state machine is pure so the generation-swap and
//! failure-skips-the-tick rules are testable without an OS process table.

use std::collections::HashMap;
use std::sync::Arc;

use sysinfo::{ProcessRefreshKind, RefreshKind, System};
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use vigil_core::classify::{self, ClassifyConfig};
use vigil_core::diff;
use vigil_core::types::{EventKind, ProcessEventData, ProcessInfo, RawProcess};

use crate::controller::ControllerInner;

/// Two-generation scan state. The previous generation is only replaced on
/// a successful scan; a failed tick leaves it untouched so the next
/// successful diff runs against pre-failure state instead of synthesizing
/// mass "ended" events.
pub(crate) struct ProcessScanState {
    previous: Option<HashMap<String, ProcessInfo>>,
}

pub(crate) enum ScanOutcome {
    /// Enumeration failed; nothing known this tick, nothing emitted.
    Skipped,
    Report {
        started: Vec<ProcessInfo>,
        ended: Vec<ProcessInfo>,
        /// Filtered set sorted by priority, for the session's live list.
        snapshot: Vec<ProcessInfo>,
    },
}

impl ProcessScanState {
    pub(crate) fn new() -> Self {
        Self { previous: None }
    }

    pub(crate) fn observe(&mut self, filtered: Option<Vec<ProcessInfo>>) -> ScanOutcome {
        let Some(filtered) = filtered else {
            return ScanOutcome::Skipped;
        };

        let current = diff::index_by_name(&filtered);
        let (started, ended) = match &self.previous {
            // First successful scan primes the generation without emitting
            // lifecycle events for everything already running.
            None => (Vec::new(), Vec::new()),
            Some(previous) => {
                let d = diff::diff_by_name(previous, &current);
                (d.started, d.ended)
            }
        };
        self.previous = Some(current);

        let mut snapshot = filtered;
        classify::sort_snapshot(&mut snapshot);
        ScanOutcome::Report {
            started,
            ended,
            snapshot,
        }
    }
}

/// Full-table enumeration. Synchronous; runs on the blocking pool.
fn enumerate_processes() -> Vec<RawProcess> {
    let system = System::new_with_specifics(
        RefreshKind::new().with_processes(ProcessRefreshKind::everything()),
    );
    system
        .processes()
        .values()
        .map(|process| {
            let name = process.name().to_string_lossy().into_owned();
            let cmd = process
                .cmd()
                .iter()
                .map(|part| part.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ");
            RawProcess {
                cmd: if cmd.is_empty() { name.clone() } else { cmd },
                name,
                bin: process.exe().map(|path| path.display().to_string()),
            }
        })
        .collect()
}

fn lifecycle_payload(process: &ProcessInfo) -> ProcessEventData {
    ProcessEventData {
        name: process.name.clone(),
        cmd: process.cmd.clone(),
        is_suspicious: process.is_suspicious,
        is_application: process.is_application,
    }
}

pub(crate) async fn run(inner: Arc<ControllerInner>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(Duration::from_millis(
        inner.capture.process_interval_ms.max(1),
    ));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let config: ClassifyConfig = inner.process.to_classify_config();
    let mut scan = ProcessScanState::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let filtered = match tokio::task::spawn_blocking(enumerate_processes).await {
                    Ok(raw) => {
                        let classified: Vec<ProcessInfo> = raw
                            .into_iter()
                            .map(|r| classify::classify(r, &config))
                            .collect();
                        Some(classify::filter_processes(classified, &config))
                    }
                    Err(err) => {
                        warn!("process enumeration failed, skipping tick: {err}");
                        None
                    }
                };

                match scan.observe(filtered) {
                    ScanOutcome::Skipped => {}
                    ScanOutcome::Report { started, ended, snapshot } => {
                        for process in &started {
                            inner.emit(EventKind::ProcessStart(lifecycle_payload(process)));
                        }
                        for process in &ended {
                            inner.emit(EventKind::ProcessEnd(lifecycle_payload(process)));
                        }

                        debug!(
                            tracked = snapshot.len(),
                            started = started.len(),
                            ended = ended.len(),
                            "process snapshot"
                        );
                        let updated = inner.with_session(|session| {
                            session.processes = snapshot.clone();
                        });
                        if let Some(session) = updated {
                            inner.push_session_update(session).await;
                        }
                    }
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, suspicious: bool, application: bool) -> ProcessInfo {
        ProcessInfo {
            name: name.into(),
            cmd: name.into(),
            bin: None,
            is_suspicious: suspicious,
            is_application: application,
        }
    }

    fn names(processes: &[ProcessInfo]) -> Vec<&str> {
        processes.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn first_scan_primes_without_lifecycle_events() {
        let mut scan = ProcessScanState::new();
        let outcome = scan.observe(Some(vec![info("zoom", false, true)]));
        match outcome {
            ScanOutcome::Report { started, ended, snapshot } => {
                assert!(started.is_empty());
                assert!(ended.is_empty());
                assert_eq!(names(&snapshot), vec!["zoom"]);
            }
            ScanOutcome::Skipped => panic!("first scan should report"),
        }
    }

    #[test]
    fn diff_reports_started_and_ended_between_generations() {
        let mut scan = ProcessScanState::new();
        scan.observe(Some(vec![info("x", false, true), info("y", false, true)]));

        let outcome = scan.observe(Some(vec![info("y", false, true), info("z", false, true)]));
        match outcome {
            ScanOutcome::Report { started, ended, .. } => {
                assert_eq!(names(&started), vec!["z"]);
                assert_eq!(names(&ended), vec!["x"]);
            }
            ScanOutcome::Skipped => panic!("scan should report"),
        }
    }

    #[test]
    fn failed_tick_preserves_the_previous_generation() {
        let mut scan = ProcessScanState::new();
        scan.observe(Some(vec![info("x", false, true), info("y", false, true)]));

        // Enumeration failure: no diff, no spurious mass-ended events.
        assert!(matches!(scan.observe(None), ScanOutcome::Skipped));

        // The next successful scan diffs against pre-failure state.
        let outcome = scan.observe(Some(vec![info("y", false, true), info("z", false, true)]));
        match outcome {
            ScanOutcome::Report { started, ended, .. } => {
                assert_eq!(names(&started), vec!["z"]);
                assert_eq!(names(&ended), vec!["x"]);
            }
            ScanOutcome::Skipped => panic!("scan should report"),
        }
    }

    #[test]
    fn failure_before_priming_stays_unprimed() {
        let mut scan = ProcessScanState::new();
        assert!(matches!(scan.observe(None), ScanOutcome::Skipped));

        // Still the priming scan: everything present, no events.
        match scan.observe(Some(vec![info("a", true, false)])) {
            ScanOutcome::Report { started, ended, .. } => {
                assert!(started.is_empty());
                assert!(ended.is_empty());
            }
            ScanOutcome::Skipped => panic!("scan should report"),
        }
    }

    #[test]
    fn snapshot_is_priority_sorted() {
        let mut scan = ProcessScanState::new();
        let outcome = scan.observe(Some(vec![
            info("app-only", false, true),
            info("both-flags", true, true),
            info("suspicious-only", true, false),
        ]));
        match outcome {
            ScanOutcome::Report { snapshot, .. } => {
                assert_eq!(snapshot[0].name, "both-flags");
            }
            ScanOutcome::Skipped => panic!("scan should report"),
        }
    }
}
