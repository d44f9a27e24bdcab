//! Persistent placement progress.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which markers the player has placed correctly.
///
/// Grows monotonically during play; the only way back is a full reset. Keys
/// are marker names and are pruned against the known catalog on load so a
/// stale save never carries phantom entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionSet {
    completed: BTreeMap<String, bool>,
}

impl CompletionSet {
    pub fn is_completed(&self, name: &str) -> bool {
        self.completed.get(name).copied().unwrap_or(false)
    }

    /// Mark a placement as solved. Returns true when this is new progress.
    pub fn mark_completed(&mut self, name: &str) -> bool {
        self.completed.insert(name.to_string(), true) != Some(true)
    }

    /// Drop entries that no longer match a known marker name.
    pub fn retain_known(&mut self, known: &[&str]) {
        self.completed.retain(|name, _| known.contains(&name.as_str()));
    }

    /// Number of solved placements.
    pub fn solved(&self) -> usize {
        self.completed.values().filter(|v| **v).count()
    }

    /// Wipe all progress.
    pub fn reset(&mut self) {
        self.completed.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_completed_is_monotonic() {
        let mut set = CompletionSet::default();
        assert!(!set.is_completed("schloss"));

        assert!(set.mark_completed("schloss"));
        assert!(set.is_completed("schloss"));

        // Marking again is a no-op, not new progress.
        assert!(!set.mark_completed("schloss"));
        assert_eq!(set.solved(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut set = CompletionSet::default();
        set.mark_completed("a");
        set.mark_completed("b");

        set.reset();
        assert!(set.is_empty());
        assert!(!set.is_completed("a"));
    }

    #[test]
    fn test_retain_known_prunes_stale_names() {
        let mut set = CompletionSet::default();
        set.mark_completed("schloss");
        set.mark_completed("renamed_marker");

        set.retain_known(&["schloss", "altstadt"]);
        assert!(set.is_completed("schloss"));
        assert!(!set.is_completed("renamed_marker"));
        assert_eq!(set.solved(), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let mut set = CompletionSet::default();
        set.mark_completed("schloss");

        let json = serde_json::to_string(&set).unwrap();
        let back: CompletionSet = serde_json::from_str(&json).unwrap();
        assert!(back.is_completed("schloss"));
    }
}
