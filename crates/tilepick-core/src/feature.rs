//! Feature and tile descriptor types.

use serde::{Deserialize, Serialize};

/// Reference to the tile a feature's geometry came from.
///
/// This is a snapshot taken at allocation time; it stays valid even if the
/// live tile object is later evicted on the main thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRef {
    /// Zoom level.
    pub z: u8,
    /// Tile column.
    pub x: u32,
    /// Tile row.
    pub y: u32,
}

impl TileRef {
    /// Creates a tile reference.
    #[must_use]
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Canonical `z/x/y` key string used by the allocator's tile registry.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.z, self.x, self.y)
    }
}

/// A fully resolved map feature, as returned from a worker.
///
/// Equality is structural over every field; the picker relies on this to
/// decide whether a newly resolved selection differs from the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Feature {
    /// Raw attribute bag from the source data.
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Name of the data source the feature came from.
    pub source_name: String,
    /// Layer within the source (vector-tile layer name).
    pub source_layer: String,
    /// Style layers that rendered this feature.
    pub layers: Vec<String>,
    /// Tile the geometry belongs to.
    pub tile: Option<TileRef>,
    /// Highlight color to use while hovered.
    pub hover_color: Option<[f32; 4]>,
    /// Highlight color to use while clicked.
    pub click_color: Option<[f32; 4]>,
}
