//! GPU-accelerated feature picking for tiled map rendering.
//!
//! Features are drawn into an off-screen target with unique colors; asking
//! "what's at this point" samples one pixel back, decodes it into a
//! [`ColorKey`], and round-trips to the worker that produced the feature's
//! geometry for its full attributes. The pieces:
//!
//! - [`Picker`]: main-thread orchestrator with the request queue, debounced
//!   readback, worker dispatch, reply routing, and per-state selection cache
//! - [`WorkerPool`] / [`WorkerHandle`]: thread-backed workers, each owning
//!   a [`SelectorService`] with its slice of the color-key space
//! - [`PickTarget`] (from `tilepick-render`): the wgpu off-screen surface
//!   and its single-pixel readback path
//!
//! A typical frame: geometry workers allocate colors while building tiles;
//! the render pipeline draws them into the bound [`PickTarget`]; input code
//! calls [`Picker::feature_at`]; the frame loop calls [`Picker::read`]
//! after the pick pass and [`Picker::process`] once per animation step.

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]

pub mod picker;
pub mod worker;

pub use picker::Picker;
pub use tilepick_core::{
    ColorKey, Feature, GroupAssignment, PickError, PickOptions, PickPoint, PixelSource, Result,
    Selection, SelectionFuture, SelectorService, TileRef, NO_GROUP_COLOR, NO_WORKER,
};
pub use tilepick_render::{PickTarget, TargetError};
pub use worker::{WorkerHandle, WorkerPool};
