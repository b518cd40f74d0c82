//! Per-UI-state cache of resolved selections.
//!
//! Each named state ("hover", "click", ...) remembers its last resolved
//! feature, group, and the group's index colors per worker, so the
//! orchestrator can skip redundant group-color refreshes and throttle them
//! to one in flight per state.

use std::collections::HashMap;

use crate::feature::Feature;
use crate::group::GroupAssignment;

/// Cached selection for one named UI state.
#[derive(Debug, Clone, Default)]
pub struct SelectionStateEntry {
    /// Last resolved feature, if any.
    pub feature: Option<Feature>,
    /// Group membership of that feature.
    pub group: Option<GroupAssignment>,
    /// Group index colors indexed by worker id; `None` where a worker has
    /// not answered (or has not seen the group).
    pub selection_colors: Vec<Option<[u8; 4]>>,
    /// True while a group-color refresh is in flight for this state.
    pub update_pending: bool,
}

/// Main-thread cache of selection state entries, keyed by state name.
#[derive(Debug, Default)]
pub struct StateCache {
    states: HashMap<String, SelectionStateEntry>,
}

impl StateCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a freshly resolved selection under `state_key`.
    pub fn store(
        &mut self,
        state_key: &str,
        feature: Option<Feature>,
        group: Option<GroupAssignment>,
        selection_colors: Vec<Option<[u8; 4]>>,
    ) {
        self.states.insert(
            state_key.to_string(),
            SelectionStateEntry {
                feature,
                group,
                selection_colors,
                update_pending: false,
            },
        );
    }

    /// Read access to one state.
    #[must_use]
    pub fn get(&self, state_key: &str) -> Option<&SelectionStateEntry> {
        self.states.get(state_key)
    }

    /// Drops one state entirely.
    pub fn clear(&mut self, state_key: &str) {
        self.states.remove(state_key);
    }

    /// Whether `state_key` needs a group-color refresh given the current
    /// worker count.
    ///
    /// False when the state is absent, has no group, already has a refresh
    /// in flight, or already holds an answer slot from every known worker.
    /// A `None` slot still counts as answered: it means that worker has
    /// simply never seen the group.
    #[must_use]
    pub fn needs_refresh(&self, state_key: &str, num_workers: usize) -> bool {
        let Some(entry) = self.states.get(state_key) else {
            return false;
        };
        if entry.update_pending {
            return false;
        }
        match &entry.group {
            Some(group) if !group.is_none() => {}
            _ => return false,
        }
        entry.selection_colors.len() < num_workers
    }

    /// Marks a refresh as started. Returns the group key to query, or
    /// `None` if the state vanished meanwhile.
    pub fn begin_refresh(&mut self, state_key: &str) -> Option<String> {
        let entry = self.states.get_mut(state_key)?;
        let group = entry.group.as_ref()?;
        entry.update_pending = true;
        Some(group.key.clone())
    }

    /// Stores refreshed colors and clears the pending flag.
    pub fn finish_refresh(&mut self, state_key: &str, selection_colors: Vec<Option<[u8; 4]>>) {
        if let Some(entry) = self.states.get_mut(state_key) {
            entry.selection_colors = selection_colors;
            entry.update_pending = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grouped_entry(cache: &mut StateCache, key: &str) {
        let mut groups = crate::group::GroupRegistry::new();
        let group = groups.assign(Some(&json!("Main St")), "name");
        cache.store(key, Some(Feature::default()), Some(group), vec![]);
    }

    #[test]
    fn test_absent_state_needs_no_refresh() {
        let cache = StateCache::new();
        assert!(!cache.needs_refresh("hover", 2));
    }

    #[test]
    fn test_groupless_state_needs_no_refresh() {
        let mut cache = StateCache::new();
        cache.store("hover", Some(Feature::default()), None, vec![]);
        assert!(!cache.needs_refresh("hover", 2));
        cache.store(
            "hover",
            Some(Feature::default()),
            Some(GroupAssignment::none()),
            vec![],
        );
        assert!(!cache.needs_refresh("hover", 2));
    }

    #[test]
    fn test_pending_refresh_blocks_another() {
        let mut cache = StateCache::new();
        grouped_entry(&mut cache, "hover");
        assert!(cache.needs_refresh("hover", 2));
        assert!(cache.begin_refresh("hover").is_some());
        assert!(!cache.needs_refresh("hover", 2));
        cache.finish_refresh("hover", vec![Some([0, 0, 1, 255]), Some([0, 0, 1, 255])]);
        assert!(!cache.needs_refresh("hover", 2));
    }

    #[test]
    fn test_new_worker_retriggers_refresh() {
        let mut cache = StateCache::new();
        grouped_entry(&mut cache, "click");
        // A None slot counts as answered: that worker has not seen the group.
        cache.finish_refresh("click", vec![Some([0, 0, 1, 255]), None]);
        assert!(!cache.needs_refresh("click", 2));
        // A third worker joining re-triggers.
        assert!(cache.needs_refresh("click", 3));
    }

    #[test]
    fn test_clear_drops_state() {
        let mut cache = StateCache::new();
        grouped_entry(&mut cache, "hover");
        cache.clear("hover");
        assert!(cache.get("hover").is_none());
    }
}
