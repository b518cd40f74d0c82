//! Core picking logic for tilepick.
//!
//! This crate holds everything that does not touch the GPU:
//! - [`ColorKey`] encoding: 24-bit per-worker entry index plus an 8-bit
//!   worker id in the alpha channel, collision-free across the worker pool
//! - [`ColorAllocator`] and [`GroupRegistry`], the per-worker state behind
//!   feature and group colors, bundled as the [`SelectorService`]
//! - [`RequestQueue`] and [`SelectionFuture`], the main-thread request
//!   lifecycle
//! - [`ReadbackClock`], the debounce for deferred pixel readback
//! - [`StateCache`], the per-UI-state memory of resolved selections
//! - the [`WorkerRequest`]/[`WorkerReply`] message contract

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod allocator;
pub mod cache;
pub mod error;
pub mod feature;
pub mod group;
pub mod key;
pub mod options;
pub mod protocol;
pub mod queue;
pub mod schedule;
pub mod selector;
pub mod source;

pub use allocator::{ColorAllocator, SelectorEntry, TileRegistryEntry};
pub use cache::{SelectionStateEntry, StateCache};
pub use error::{PickError, Result};
pub use feature::{Feature, TileRef};
pub use group::{GroupAssignment, GroupRegistry, NO_GROUP_COLOR};
pub use key::{ColorKey, NO_WORKER};
pub use options::PickOptions;
pub use protocol::{Selection, WorkerReply, WorkerRequest};
pub use queue::{PickPoint, RequestQueue, SelectionFuture, SelectionRequest};
pub use schedule::{ReadbackClock, DEFAULT_READ_DELAY};
pub use selector::SelectorService;
pub use source::PixelSource;
