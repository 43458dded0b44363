//! Process classification: turning a raw OS process listing into the small
//! flagged subset worth recording.
//!
//! Matching is case-insensitive everywhere. Denylist entries longer than
//! three characters match as substrings; shorter entries require an exact
//! match so that tokens like "obs" do not light up half the process table.

use crate::types::{ProcessInfo, RawProcess};

/// Remote-control, screen-sharing and interview-assistance tooling whose
/// presence during a monitored call is worth flagging.
pub const SUSPICIOUS_PROCESS_PATTERNS: &[&str] = &[
    "teamviewer",
    "anydesk",
    "rustdesk",
    "splashtop",
    "screenconnect",
    "ultraviewer",
    "dwservice",
    "getscreen",
    "chrome remote desktop",
    "parsec",
    "realvnc",
    "tightvnc",
    "ultravnc",
    "vnc",
    "obs",
    "cluely",
    "interview coder",
    "interviewcoder",
];

/// Name/cmd fragments of infrastructure processes that churn every tick and
/// carry no signal. Filtered out unless explicitly include-listed.
pub const SYSTEM_PROCESS_PATTERNS: &[&str] = &[
    "com.apple.",
    "windowserver",
    "coreservices",
    "crashpad",
    "launchd",
    "mdworker",
    "svchost",
    "wininit",
    "winlogon",
    "ctfmon",
    "dwm.exe",
    "conhost",
    "systemd",
    "kworker",
    "dbus-daemon",
    "helper (renderer)",
    "helper (gpu)",
    "helper (plugin)",
];

/// Runtime knobs for [`filter_processes`]; field-for-field counterpart of
/// the `[process]` config section.
#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    pub exclude_system_processes: bool,
    pub include_patterns: Vec<String>,
    pub extra_suspicious: Vec<String>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            exclude_system_processes: true,
            include_patterns: Vec::new(),
            extra_suspicious: Vec::new(),
        }
    }
}

/// Denylist matching rule: substring for patterns longer than 3 chars,
/// exact match otherwise. `pattern` must already be lowercase.
fn matches_denylist_entry(pattern: &str, name: &str, cmd: &str, bin: &str) -> bool {
    if pattern.len() > 3 {
        name.contains(pattern) || cmd.contains(pattern) || bin.contains(pattern)
    } else {
        name == pattern || cmd == pattern || bin == pattern
    }
}

pub fn is_suspicious(raw: &RawProcess, extra: &[String]) -> bool {
    let name = raw.name.to_lowercase();
    let cmd = raw.cmd.to_lowercase();
    let bin = raw.bin.as_deref().unwrap_or("").to_lowercase();

    SUSPICIOUS_PROCESS_PATTERNS
        .iter()
        .map(|p| (*p).to_string())
        .chain(extra.iter().map(|p| p.to_lowercase()))
        .any(|pattern| matches_denylist_entry(&pattern, &name, &cmd, &bin))
}

/// Heuristic for "user-facing application": installed-application paths on
/// macOS and Windows, or a per-user executable on Windows.
pub fn is_application(raw: &RawProcess) -> bool {
    let name = raw.name.to_lowercase();
    let cmd = raw.cmd.to_lowercase();
    let bin = raw.bin.as_deref().unwrap_or("").to_lowercase();

    if cmd.contains(".app/") {
        return true;
    }
    if bin.contains("/applications/") || bin.contains("program files") {
        return true;
    }
    if name.ends_with(".exe") && (bin.contains("users\\") || bin.contains("appdata\\")) {
        return true;
    }
    false
}

pub fn classify(raw: RawProcess, config: &ClassifyConfig) -> ProcessInfo {
    let is_suspicious = is_suspicious(&raw, &config.extra_suspicious);
    let is_application = is_application(&raw);
    ProcessInfo {
        name: raw.name,
        cmd: raw.cmd,
        bin: raw.bin,
        is_suspicious,
        is_application,
    }
}

fn matches_any_pattern(process: &ProcessInfo, patterns: &[String]) -> bool {
    let name = process.name.to_lowercase();
    let cmd = process.cmd.to_lowercase();
    patterns.iter().any(|pattern| {
        let pattern = pattern.to_lowercase();
        name.contains(&pattern) || cmd.contains(&pattern)
    })
}

/// Reduce a classified listing to the recordable subset: keep flagged
/// entries, drop system-pattern matches unless include-listed, and
/// de-duplicate by name (first-seen position, last-seen value).
pub fn filter_processes(processes: Vec<ProcessInfo>, config: &ClassifyConfig) -> Vec<ProcessInfo> {
    let system_patterns: Vec<String> = SYSTEM_PROCESS_PATTERNS
        .iter()
        .map(|p| (*p).to_string())
        .collect();

    let mut result: Vec<ProcessInfo> = Vec::new();
    let mut index_by_name: std::collections::HashMap<String, usize> =
        std::collections::HashMap::new();

    for process in processes {
        if config.exclude_system_processes
            && matches_any_pattern(&process, &system_patterns)
            && !matches_any_pattern(&process, &config.include_patterns)
        {
            continue;
        }
        if !process.is_application && !process.is_suspicious {
            continue;
        }

        match index_by_name.get(&process.name) {
            Some(&i) => result[i] = process,
            None => {
                index_by_name.insert(process.name.clone(), result.len());
                result.push(process);
            }
        }
    }

    result
}

/// Order a snapshot for storage: doubly-flagged entries first. Stable, so
/// entries with equal priority keep their listing order.
pub fn sort_snapshot(processes: &mut [ProcessInfo]) {
    processes.sort_by(|a, b| b.priority().cmp(&a.priority()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, cmd: &str, bin: Option<&str>) -> RawProcess {
        RawProcess {
            name: name.into(),
            cmd: cmd.into(),
            bin: bin.map(Into::into),
        }
    }

    #[test]
    fn long_denylist_entries_match_as_substring() {
        let process = raw(
            "TeamViewer_Desktop",
            "/opt/teamviewer/tv_bin/TeamViewer_Desktop",
            None,
        );
        assert!(is_suspicious(&process, &[]));
    }

    #[test]
    fn short_denylist_entries_require_exact_match() {
        // "obs" must not match a process that merely contains the letters.
        let jobs = raw("jobscheduler", "jobscheduler --run", None);
        assert!(!is_suspicious(&jobs, &[]));

        let obs = raw("obs", "obs", None);
        assert!(is_suspicious(&obs, &[]));
    }

    #[test]
    fn denylist_matching_is_case_insensitive() {
        let process = raw("AnyDesk", "C:\\Program Files\\AnyDesk\\AnyDesk.exe", None);
        assert!(is_suspicious(&process, &[]));
    }

    #[test]
    fn extra_patterns_extend_the_denylist() {
        let process = raw("copilot-overlay", "copilot-overlay --attach", None);
        assert!(!is_suspicious(&process, &[]));
        assert!(is_suspicious(&process, &["copilot-overlay".to_string()]));
    }

    #[test]
    fn application_heuristics_cover_both_platforms() {
        assert!(is_application(&raw(
            "Zoom",
            "/Applications/zoom.us.app/Contents/MacOS/zoom.us",
            None,
        )));
        assert!(is_application(&raw(
            "slack.exe",
            "slack",
            Some("C:\\Users\\dev\\AppData\\Local\\slack\\slack.exe"),
        )));
        assert!(!is_application(&raw("bash", "/bin/bash", Some("/bin/bash"))));
    }

    #[test]
    fn filter_keeps_only_flagged_and_drops_system_noise() {
        let config = ClassifyConfig::default();
        let processes = vec![
            classify(raw("bash", "/bin/bash", None), &config),
            classify(
                raw("Zoom", "/Applications/zoom.us.app/Contents/MacOS/zoom.us", None),
                &config,
            ),
            classify(
                raw(
                    "com.apple.WebKit.WebContent",
                    "/System/Library/com.apple.WebKit.WebContent.app/x",
                    None,
                ),
                &config,
            ),
        ];

        let filtered = filter_processes(processes, &config);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Zoom");
    }

    #[test]
    fn filter_dedups_by_name_last_value_wins() {
        let config = ClassifyConfig::default();
        let older = ProcessInfo {
            name: "anydesk".into(),
            cmd: "anydesk --old".into(),
            bin: None,
            is_suspicious: true,
            is_application: false,
        };
        let newer = ProcessInfo {
            cmd: "anydesk --new".into(),
            ..older.clone()
        };

        let filtered = filter_processes(vec![older, newer], &config);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].cmd, "anydesk --new");
    }

    #[test]
    fn include_patterns_override_system_exclusion() {
        let config = ClassifyConfig {
            include_patterns: vec!["svchost".into()],
            ..ClassifyConfig::default()
        };
        let process = ProcessInfo {
            name: "svchost.exe".into(),
            cmd: "svchost.exe -k netsvcs".into(),
            bin: Some("C:\\Users\\dev\\AppData\\svchost.exe".into()),
            is_suspicious: false,
            is_application: true,
        };

        let filtered = filter_processes(vec![process], &config);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn snapshot_sorts_doubly_flagged_first() {
        let mut snapshot = vec![
            ProcessInfo {
                name: "Zoom".into(),
                cmd: "zoom".into(),
                bin: None,
                is_suspicious: false,
                is_application: true,
            },
            ProcessInfo {
                name: "AnyDesk".into(),
                cmd: "/Applications/AnyDesk.app/x".into(),
                bin: None,
                is_suspicious: true,
                is_application: true,
            },
            ProcessInfo {
                name: "vnc".into(),
                cmd: "vnc".into(),
                bin: None,
                is_suspicious: true,
                is_application: false,
            },
        ];

        sort_snapshot(&mut snapshot);
        assert_eq!(snapshot[0].name, "AnyDesk");
        assert_eq!(snapshot[0].priority(), 2);
        // Equal priorities keep their relative order.
        assert_eq!(snapshot[1].name, "Zoom");
        assert_eq!(snapshot[2].name, "vnc");
    }
}
