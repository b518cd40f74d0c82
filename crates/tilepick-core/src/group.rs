//! Selection-group registry.
//!
//! Selection groups cluster features that should highlight together (all
//! road segments with the same name, say). The group namespace is separate
//! from the per-feature [`ColorKey`](crate::key::ColorKey) space: it is a
//! small sequential counter, collision-checked only within itself, and the
//! same composite key always maps to the same index color so every worker
//! that sees the group renders the same highlight.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Index color meaning "this feature belongs to no group".
pub const NO_GROUP_COLOR: [u8; 4] = [255, 255, 255, 255];

/// A group membership handed out by [`GroupRegistry::assign`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAssignment {
    /// Shared highlight index color for every member of the group.
    pub index_color: [u8; 4],
    /// Composite group key (`"{base_key}:{value}"`).
    pub key: String,
    /// The grouping value the selection rule produced.
    pub value: serde_json::Value,
}

impl GroupAssignment {
    /// The sentinel assignment for features with no grouping value.
    #[must_use]
    pub fn none() -> Self {
        Self {
            index_color: NO_GROUP_COLOR,
            key: String::new(),
            value: serde_json::Value::Null,
        }
    }

    /// True when this is the "no group" sentinel.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.key.is_empty()
    }
}

/// Per-worker registry of selection groups.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    assignments: HashMap<String, GroupAssignment>,
    next_index: u32,
}

impl GroupRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the group assignment for `value` under `base_key`, allocating
    /// the next sequential index color on first sight.
    ///
    /// A `None` value yields the sentinel "no group" assignment.
    pub fn assign(
        &mut self,
        value: Option<&serde_json::Value>,
        base_key: &str,
    ) -> GroupAssignment {
        let Some(value) = value else {
            return GroupAssignment::none();
        };

        let key = format!("{base_key}:{value}");
        if let Some(existing) = self.assignments.get(&key) {
            return existing.clone();
        }

        // Sequential 24-bit index; wraps at 16M, never reached in practice.
        self.next_index = (self.next_index + 1) & 0x00FF_FFFF;
        let index = self.next_index;
        let assignment = GroupAssignment {
            index_color: [
                ((index >> 16) & 0xFF) as u8,
                ((index >> 8) & 0xFF) as u8,
                (index & 0xFF) as u8,
                255,
            ],
            key: key.clone(),
            value: value.clone(),
        };
        self.assignments.insert(key, assignment.clone());
        assignment
    }

    /// Looks up the index color a composite group key was assigned, if any.
    #[must_use]
    pub fn color_for(&self, group_key: &str) -> Option<[u8; 4]> {
        self.assignments.get(group_key).map(|a| a.index_color)
    }

    /// Wipes all assignments and counters.
    pub fn reset(&mut self) {
        self.assignments.clear();
        self.next_index = 0;
    }
}
