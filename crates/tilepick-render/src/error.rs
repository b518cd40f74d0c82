//! Render-side error types.

use thiserror::Error;

/// Errors from the picking target.
#[derive(Error, Debug)]
pub enum TargetError {
    /// Sample coordinates fall outside the target.
    #[error("pixel ({x}, {y}) outside {width}x{height} picking target")]
    OutOfBounds {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
        /// Target width.
        width: u32,
        /// Target height.
        height: u32,
    },

    /// Mapping the staging buffer for readback failed.
    #[error("staging buffer map failed: {0}")]
    MapFailed(#[from] wgpu::BufferAsyncError),

    /// The map callback never delivered a result.
    #[error("readback channel closed before the map completed")]
    ReadbackChannelClosed,
}

/// A specialized Result type for render-side operations.
pub type TargetResult<T> = std::result::Result<T, TargetError>;
