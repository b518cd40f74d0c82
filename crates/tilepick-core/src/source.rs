//! Seam between the picking logic and the render backend.

/// A readable picking surface.
///
/// The render crate's off-screen target implements this; tests substitute
/// in-memory fakes.
pub trait PixelSource {
    /// Whether the surface is safe to sample right now. An unstable frame
    /// drops the whole read pass; the next render trigger reschedules it.
    fn is_stable(&self) -> bool;

    /// Surface size in pixels, `(width, height)`.
    fn extent(&self) -> (u32, u32);

    /// Samples one pixel as RGBA bytes. `None` for out-of-bounds
    /// coordinates or a failed readback.
    fn sample(&self, x: u32, y: u32) -> Option<[u8; 4]>;
}
