//! Configuration options for the picking core.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the picker and its render target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickOptions {
    /// Deferral between a render trigger and the actual pixel readback.
    /// Defaults to roughly one frame's worth of GPU/CPU pipeline latency.
    pub read_delay: Duration,

    /// Width of the off-screen picking target in pixels. Fixed, independent
    /// of the visible canvas size.
    pub target_width: u32,

    /// Height of the off-screen picking target in pixels.
    pub target_height: u32,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            read_delay: crate::schedule::DEFAULT_READ_DELAY,
            target_width: 512,
            target_height: 512,
        }
    }
}
