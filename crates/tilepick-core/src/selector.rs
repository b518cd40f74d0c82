//! Worker-side selector service.
//!
//! Bundles the per-worker [`ColorAllocator`] and [`GroupRegistry`] and
//! answers the picker's protocol messages. One instance lives in each
//! worker context; the drawing code on the same worker calls
//! [`SelectorService::allocate`] directly while producing tile geometry.

use log::debug;

use crate::allocator::{ColorAllocator, SelectorEntry};
use crate::feature::TileRef;
use crate::group::{GroupAssignment, GroupRegistry};
use crate::key::ColorKey;
use crate::protocol::{WorkerRequest, WorkerReply};

/// Per-worker selection state and protocol handler.
#[derive(Debug)]
pub struct SelectorService {
    allocator: ColorAllocator,
    groups: GroupRegistry,
}

impl SelectorService {
    /// Creates the service for one worker id.
    #[must_use]
    pub fn new(worker_id: u8) -> Self {
        Self {
            allocator: ColorAllocator::new(worker_id),
            groups: GroupRegistry::new(),
        }
    }

    /// The owning worker's id.
    #[must_use]
    pub fn worker_id(&self) -> u8 {
        self.allocator.worker_id()
    }

    /// Allocates a picking color for a feature in `tile`; the caller fills
    /// in the returned entry's feature and group fields.
    pub fn allocate(&mut self, tile: &TileRef) -> (ColorKey, &mut SelectorEntry) {
        self.allocator.allocate(tile)
    }

    /// Assigns (or re-uses) a selection group for a feature.
    pub fn assign_group(
        &mut self,
        value: Option<&serde_json::Value>,
        base_key: &str,
    ) -> GroupAssignment {
        self.groups.assign(value, base_key)
    }

    /// Read access to the allocator, mainly for draw-time lookups.
    #[must_use]
    pub fn allocator(&self) -> &ColorAllocator {
        &self.allocator
    }

    /// Forwards a tile release to the allocator (currently a no-op there).
    pub fn release_tile(&mut self, tile_key: &str) {
        self.allocator.release_tile(tile_key);
    }

    /// Handles one protocol request, producing the reply to send back (if
    /// the request warrants one).
    pub fn handle(&mut self, request: WorkerRequest) -> Option<WorkerReply> {
        match request {
            WorkerRequest::GetFeatureSelection { request_id, key } => {
                let worker_id = self.worker_id();
                let entry = self.allocator.get(key);
                if entry.is_none() {
                    debug!(
                        "worker {worker_id}: no entry for key {:#010x}",
                        key.as_u32()
                    );
                }
                let (feature, group) = entry
                    .map(|e| (e.feature.clone(), e.group.clone()))
                    .unwrap_or((None, GroupAssignment::none()));
                Some(WorkerReply::FeatureSelection {
                    request_id,
                    worker_id,
                    feature,
                    group,
                })
            }
            WorkerRequest::GetGroupColor { token, group_key } => Some(WorkerReply::GroupColor {
                token,
                worker_id: self.worker_id(),
                color: self.groups.color_for(&group_key),
            }),
            WorkerRequest::Reset => {
                self.allocator.reset();
                self.groups.reset();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use serde_json::json;

    fn tile() -> TileRef {
        TileRef::new(5, 9, 12)
    }

    fn populated_service() -> (SelectorService, ColorKey) {
        let mut svc = SelectorService::new(2);
        let group = svc.assign_group(Some(&json!("Main St")), "name");
        let (key, entry) = svc.allocate(&tile());
        entry.feature = Some(Feature {
            source_name: "composite".into(),
            source_layer: "road".into(),
            ..Feature::default()
        });
        entry.group = group;
        (svc, key)
    }

    #[test]
    fn test_feature_selection_roundtrip() {
        let (mut svc, key) = populated_service();
        let reply = svc
            .handle(WorkerRequest::GetFeatureSelection { request_id: 7, key })
            .unwrap();
        match reply {
            WorkerReply::FeatureSelection {
                request_id,
                worker_id,
                feature,
                group,
            } => {
                assert_eq!(request_id, 7);
                assert_eq!(worker_id, 2);
                assert_eq!(feature.unwrap().source_layer, "road");
                assert!(!group.is_none());
            }
            WorkerReply::GroupColor { .. } => panic!("wrong reply kind"),
        }
    }

    #[test]
    fn test_unknown_key_yields_empty_feature() {
        let mut svc = SelectorService::new(0);
        let reply = svc
            .handle(WorkerRequest::GetFeatureSelection {
                request_id: 1,
                key: ColorKey::new(0, 42),
            })
            .unwrap();
        match reply {
            WorkerReply::FeatureSelection { feature, group, .. } => {
                assert!(feature.is_none());
                assert!(group.is_none());
            }
            WorkerReply::GroupColor { .. } => panic!("wrong reply kind"),
        }
    }

    #[test]
    fn test_group_color_lookup() {
        let (mut svc, _) = populated_service();
        let group_key = format!("name:{}", json!("Main St"));
        let reply = svc
            .handle(WorkerRequest::GetGroupColor {
                token: 3,
                group_key,
            })
            .unwrap();
        match reply {
            WorkerReply::GroupColor { token, color, .. } => {
                assert_eq!(token, 3);
                assert!(color.is_some());
            }
            WorkerReply::FeatureSelection { .. } => panic!("wrong reply kind"),
        }
    }

    #[test]
    fn test_reset_has_no_reply_and_wipes_state() {
        let (mut svc, key) = populated_service();
        assert!(svc.handle(WorkerRequest::Reset).is_none());
        let reply = svc
            .handle(WorkerRequest::GetFeatureSelection { request_id: 9, key })
            .unwrap();
        match reply {
            WorkerReply::FeatureSelection { feature, .. } => assert!(feature.is_none()),
            WorkerReply::GroupColor { .. } => panic!("wrong reply kind"),
        }
    }
}
