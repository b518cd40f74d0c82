//! wgpu backend for tilepick.
//!
//! Owns the off-screen picking target: an RGBA8 color attachment whose
//! pixels are [`ColorKey`](tilepick_core::ColorKey) encodings, a depth
//! buffer so occlusion matches the visible scene, and the staging-buffer
//! path that samples single pixels back to the CPU.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod target;

pub use error::{TargetError, TargetResult};
pub use target::{PickDrawUniforms, PickTarget};
