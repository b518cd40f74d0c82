//! Message contract between the main-thread picker and the worker pool.
//!
//! Every exchange is asynchronous request/response over a channel per
//! worker, correlated by an id carried in the message. Replies from all
//! workers funnel into one shared channel on the main thread and may arrive
//! in any order.

use crate::feature::Feature;
use crate::group::GroupAssignment;
use crate::key::ColorKey;

/// Requests sent from the picker to a single worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerRequest {
    /// Resolve a decoded color key into its full feature payload.
    GetFeatureSelection {
        /// Id of the selection request this resolution belongs to.
        request_id: u64,
        /// The key decoded from the sampled pixel.
        key: ColorKey,
    },
    /// Fetch this worker's index color for a composite group key.
    /// Broadcast to every worker, since different workers may hold
    /// different features of the same group.
    GetGroupColor {
        /// Correlation token for the gather this reply belongs to.
        token: u64,
        /// Composite group key (`"{base_key}:{value}"`).
        group_key: String,
    },
    /// Wipe the worker's allocator and group registry.
    Reset,
}

/// Replies funneled back to the main thread.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerReply {
    /// Answer to [`WorkerRequest::GetFeatureSelection`].
    FeatureSelection {
        /// Echo of the originating request id.
        request_id: u64,
        /// Id of the answering worker.
        worker_id: u8,
        /// The feature, or `None` if the key is unknown to this worker.
        feature: Option<Feature>,
        /// The feature's group membership.
        group: GroupAssignment,
    },
    /// Answer to [`WorkerRequest::GetGroupColor`].
    GroupColor {
        /// Echo of the gather token.
        token: u64,
        /// Id of the answering worker.
        worker_id: u8,
        /// This worker's index color for the group, if it has seen it.
        color: Option<[u8; 4]>,
    },
}

/// The resolved outcome of a selection request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    /// The feature under the queried point, if any.
    pub feature: Option<Feature>,
    /// Whether this selection differs structurally from the previous one,
    /// including none ↔ some transitions.
    pub changed: bool,
    /// Group index colors indexed by worker id; `None` for workers that have
    /// not seen the group.
    pub selection_colors: Vec<Option<[u8; 4]>>,
    /// The selected feature's group membership, when a feature was found.
    pub group: Option<GroupAssignment>,
}
