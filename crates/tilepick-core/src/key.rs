//! Color-key encoding for picked features.
//!
//! Every feature drawn into the picking target carries a unique RGBA color
//! that encodes a [`ColorKey`]: the red/green/blue channels hold a 24-bit
//! per-worker entry index and the alpha channel holds the owning worker id.
//! Because each worker only ever mints keys with its own id in the low byte,
//! keys are collision-free across the whole pool without any coordination.

/// Sentinel worker id meaning "no feature here".
///
/// The picking target clears to opaque white, so an untouched pixel decodes
/// to this id. It must never be assigned to a real worker.
pub const NO_WORKER: u8 = 255;

/// Number of entry-index bits available per worker.
pub const ENTRY_INDEX_BITS: u32 = 24;

/// A 32-bit feature key: `[entry_index: 24 bits][worker_id: 8 bits]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorKey(u32);

impl ColorKey {
    /// Builds a key from its parts. `entry_index` is truncated to 24 bits.
    #[must_use]
    pub fn new(worker_id: u8, entry_index: u32) -> Self {
        Self(((entry_index & 0x00FF_FFFF) << 8) | u32::from(worker_id))
    }

    /// The id of the worker that allocated this key.
    #[must_use]
    pub fn worker_id(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// The worker-local entry index.
    #[must_use]
    pub fn entry_index(self) -> u32 {
        self.0 >> 8
    }

    /// True when this key carries the [`NO_WORKER`] sentinel.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.worker_id() == NO_WORKER
    }

    /// Decodes a key from a sampled RGBA pixel.
    ///
    /// R carries entry-index bits 16-23, G bits 8-15, B bits 0-7; A carries
    /// the worker id.
    #[must_use]
    pub fn from_pixel(pixel: [u8; 4]) -> Self {
        let index = (u32::from(pixel[0]) << 16) | (u32::from(pixel[1]) << 8) | u32::from(pixel[2]);
        Self::new(pixel[3], index)
    }

    /// Encodes this key as the RGBA bytes a pick-pass draw must write.
    #[must_use]
    pub fn to_pixel(self) -> [u8; 4] {
        let index = self.entry_index();
        [
            ((index >> 16) & 0xFF) as u8,
            ((index >> 8) & 0xFF) as u8,
            (index & 0xFF) as u8,
            self.worker_id(),
        ]
    }

    /// Normalized-float form of [`Self::to_pixel`], for shader uniforms.
    #[must_use]
    pub fn to_rgba_f32(self) -> [f32; 4] {
        let p = self.to_pixel();
        [
            f32::from(p[0]) / 255.0,
            f32::from(p[1]) / 255.0,
            f32::from(p[2]) / 255.0,
            f32::from(p[3]) / 255.0,
        ]
    }

    /// The raw 32-bit value.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parts_roundtrip() {
        let key = ColorKey::new(7, 0x00AB_CDEF);
        assert_eq!(key.worker_id(), 7);
        assert_eq!(key.entry_index(), 0x00AB_CDEF);
    }

    #[test]
    fn test_specific_pixels() {
        assert_eq!(ColorKey::new(0, 0).to_pixel(), [0, 0, 0, 0]);
        assert_eq!(ColorKey::new(0, 1).to_pixel(), [0, 0, 1, 0]);
        assert_eq!(ColorKey::new(3, 256).to_pixel(), [0, 1, 0, 3]);
        assert_eq!(ColorKey::new(3, 0x00FF_0000).to_pixel(), [255, 0, 0, 3]);
    }

    #[test]
    fn test_empty_pixel_is_sentinel() {
        // The target clears to opaque white.
        let key = ColorKey::from_pixel([255, 255, 255, 255]);
        assert!(key.is_empty());
        assert_eq!(key.worker_id(), NO_WORKER);
    }

    #[test]
    fn test_entry_index_truncates_to_24_bits() {
        let key = ColorKey::new(1, 0xFFFF_FFFF);
        assert_eq!(key.entry_index(), 0x00FF_FFFF);
    }

    proptest! {
        #[test]
        fn prop_pixel_roundtrip(worker_id in 0u8..=255, index in 0u32..0x0100_0000) {
            let key = ColorKey::new(worker_id, index);
            let decoded = ColorKey::from_pixel(key.to_pixel());
            prop_assert_eq!(decoded, key);
            prop_assert_eq!(decoded.worker_id(), worker_id);
            prop_assert_eq!(decoded.entry_index(), index);
        }
    }
}
