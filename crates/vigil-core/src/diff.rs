//! Process-lifecycle diffing between two generation snapshots.
//!
//! The previous generation is never mutated while being compared; each poll
//! builds a fresh map and the caller swaps it in afterwards. Output order is
//! name-sorted so downstream event emission is deterministic.

use std::collections::HashMap;

use crate::types::ProcessInfo;

/// Start/end lifecycle changes between two polls, keyed by process name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessDiff {
    pub started: Vec<ProcessInfo>,
    pub ended: Vec<ProcessInfo>,
}

impl ProcessDiff {
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.ended.is_empty()
    }
}

/// Index a filtered snapshot by process name for generation comparison.
pub fn index_by_name(processes: &[ProcessInfo]) -> HashMap<String, ProcessInfo> {
    processes
        .iter()
        .map(|p| (p.name.clone(), p.clone()))
        .collect()
}

/// Diff two generations by name: present now but not before → started;
/// present before but not now → ended. A name surviving between ticks emits
/// nothing, whatever else changed about it.
pub fn diff_by_name(
    previous: &HashMap<String, ProcessInfo>,
    current: &HashMap<String, ProcessInfo>,
) -> ProcessDiff {
    let mut started: Vec<ProcessInfo> = current
        .iter()
        .filter(|(name, _)| !previous.contains_key(*name))
        .map(|(_, p)| p.clone())
        .collect();
    let mut ended: Vec<ProcessInfo> = previous
        .iter()
        .filter(|(name, _)| !current.contains_key(*name))
        .map(|(_, p)| p.clone())
        .collect();

    started.sort_by(|a, b| a.name.cmp(&b.name));
    ended.sort_by(|a, b| a.name.cmp(&b.name));

    ProcessDiff { started, ended }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> ProcessInfo {
        ProcessInfo {
            name: name.into(),
            cmd: name.into(),
            bin: None,
            is_suspicious: false,
            is_application: true,
        }
    }

    fn generation(names: &[&str]) -> HashMap<String, ProcessInfo> {
        index_by_name(&names.iter().map(|n| info(n)).collect::<Vec<_>>())
    }

    #[test]
    fn diff_reports_started_and_ended_by_name() {
        // Poll A = {x, y}, poll B = {y, z}: one end for x, one start for z,
        // nothing for y.
        let previous = generation(&["x", "y"]);
        let current = generation(&["y", "z"]);

        let diff = diff_by_name(&previous, &current);
        assert_eq!(diff.started.len(), 1);
        assert_eq!(diff.started[0].name, "z");
        assert_eq!(diff.ended.len(), 1);
        assert_eq!(diff.ended[0].name, "x");
    }

    #[test]
    fn surviving_name_with_changed_fields_emits_nothing() {
        let previous = generation(&["zoom"]);
        let mut current = generation(&["zoom"]);
        current.get_mut("zoom").unwrap().cmd = "zoom --meeting 42".into();

        assert!(diff_by_name(&previous, &current).is_empty());
    }

    #[test]
    fn identical_generations_are_a_noop() {
        let a = generation(&["a", "b", "c"]);
        assert!(diff_by_name(&a, &a).is_empty());
    }

    #[test]
    fn empty_previous_marks_everything_started() {
        let previous = generation(&[]);
        let current = generation(&["a", "b"]);

        let diff = diff_by_name(&previous, &current);
        assert_eq!(diff.started.len(), 2);
        assert!(diff.ended.is_empty());
        // Name-sorted for deterministic emission order.
        assert_eq!(diff.started[0].name, "a");
        assert_eq!(diff.started[1].name, "b");
    }
}

#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn name_set() -> impl Strategy<Value = HashSet<String>> {
        proptest::collection::hash_set("[a-e]{1,2}", 0..8)
    }

    fn to_generation(names: &HashSet<String>) -> HashMap<String, ProcessInfo> {
        names
            .iter()
            .map(|n| {
                (
                    n.clone(),
                    ProcessInfo {
                        name: n.clone(),
                        cmd: n.clone(),
                        bin: None,
                        is_suspicious: false,
                        is_application: true,
                    },
                )
            })
            .collect()
    }

    proptest! {
        /// started = current \ previous and ended = previous \ current,
        /// exactly and with no overlap.
        #[test]
        fn diff_partitions_the_symmetric_difference(prev in name_set(), curr in name_set()) {
            let diff = diff_by_name(&to_generation(&prev), &to_generation(&curr));

            let started: HashSet<String> = diff.started.iter().map(|p| p.name.clone()).collect();
            let ended: HashSet<String> = diff.ended.iter().map(|p| p.name.clone()).collect();

            prop_assert_eq!(&started, &curr.difference(&prev).cloned().collect::<HashSet<_>>());
            prop_assert_eq!(&ended, &prev.difference(&curr).cloned().collect::<HashSet<_>>());
            prop_assert!(started.is_disjoint(&ended));
        }

        /// Applying the diff to the previous name set yields the current one.
        #[test]
        fn diff_is_a_faithful_delta(prev in name_set(), curr in name_set()) {
            let diff = diff_by_name(&to_generation(&prev), &to_generation(&curr));

            let mut reconstructed = prev.clone();
            for p in &diff.ended {
                reconstructed.remove(&p.name);
            }
            for p in &diff.started {
                reconstructed.insert(p.name.clone());
            }
            prop_assert_eq!(reconstructed, curr);
        }
    }
}
