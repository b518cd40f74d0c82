//! Per-worker color allocation and the authoritative key → feature map.

use std::collections::HashMap;

use crate::feature::{Feature, TileRef};
use crate::group::GroupAssignment;
use crate::key::{ColorKey, NO_WORKER};

/// One allocated picking slot: the draw color plus the feature data the
/// worker fills in at draw time.
#[derive(Debug, Clone)]
pub struct SelectorEntry {
    /// Normalized RGBA color the pick pass must draw this feature with.
    pub color: [f32; 4],
    /// Full feature payload, populated by the caller after allocation.
    pub feature: Option<Feature>,
    /// Selection-group membership, populated by the caller.
    pub group: GroupAssignment,
}

/// Book-keeping for one tile's allocated keys.
#[derive(Debug, Clone)]
pub struct TileRegistryEntry {
    /// Snapshot of the tile this entry tracks.
    pub tile: TileRef,
    /// Keys allocated for the tile, in allocation order.
    pub entry_keys: Vec<ColorKey>,
}

/// Allocates unique [`ColorKey`]s within one worker's 24-bit index space.
///
/// One instance lives in each worker context and is threaded through calls
/// explicitly; it owns the only authoritative key → entry map for its
/// worker id.
#[derive(Debug)]
pub struct ColorAllocator {
    worker_id: u8,
    counter: u32,
    entries: HashMap<ColorKey, SelectorEntry>,
    tiles: HashMap<String, TileRegistryEntry>,
}

impl ColorAllocator {
    /// Creates an allocator for the given worker id.
    ///
    /// # Panics
    ///
    /// Panics if `worker_id` is the [`NO_WORKER`] sentinel.
    #[must_use]
    pub fn new(worker_id: u8) -> Self {
        assert_ne!(worker_id, NO_WORKER, "worker id 255 is reserved");
        Self {
            worker_id,
            counter: 0,
            entries: HashMap::new(),
            tiles: HashMap::new(),
        }
    }

    /// The worker id this allocator mints keys for.
    #[must_use]
    pub fn worker_id(&self) -> u8 {
        self.worker_id
    }

    /// Allocates the next key for a feature in `tile` and returns it with
    /// a mutable entry for the caller to populate.
    ///
    /// Allocation cannot fail; the 24-bit index space is far larger than any
    /// practical feature count per worker lifetime.
    pub fn allocate(&mut self, tile: &TileRef) -> (ColorKey, &mut SelectorEntry) {
        self.counter += 1;
        let key = ColorKey::new(self.worker_id, self.counter & 0x00FF_FFFF);

        self.tiles
            .entry(tile.key())
            .or_insert_with(|| TileRegistryEntry {
                tile: tile.clone(),
                entry_keys: Vec::new(),
            })
            .entry_keys
            .push(key);

        let entry = self.entries.entry(key).or_insert(SelectorEntry {
            color: key.to_rgba_f32(),
            feature: None,
            group: GroupAssignment::none(),
        });
        (key, entry)
    }

    /// Looks up the entry for a previously allocated key.
    #[must_use]
    pub fn get(&self, key: ColorKey) -> Option<&SelectorEntry> {
        self.entries.get(&key)
    }

    /// Returns the tile registry entry for a tile key, if any features were
    /// allocated for it.
    #[must_use]
    pub fn tile_entry(&self, tile_key: &str) -> Option<&TileRegistryEntry> {
        self.tiles.get(tile_key)
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wipes all entries, tiles, and counters. Called when the worker's
    /// module state is rebuilt, e.g. on style reload.
    pub fn reset(&mut self) {
        self.counter = 0;
        self.entries.clear();
        self.tiles.clear();
    }

    /// Releases a tile's entries.
    ///
    /// Intentionally a no-op: freeing requires reference counting of keys
    /// still referenced by in-flight selection requests, which was never
    /// completed upstream. Entries for dead tiles stay resident until the
    /// next `reset`.
    pub fn release_tile(&mut self, tile_key: &str) {
        let _ = tile_key;
    }
}
