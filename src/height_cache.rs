//! Identity-keyed cache of resolved item heights.

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use crate::item::ItemId;

/// Maps item identity to its resolved height in layout units.
///
/// The cache lives for a whole layout session and is append-only: entries
/// are written on first resolution and never evicted automatically, so an
/// item seen again in a later page places without another probe. It is
/// safe to share across probe worker threads; duplicate concurrent writes
/// for one identity are benign because every write for a given input
/// produces the same value. [`HeightCache::clear`] exists for callers that
/// need a stronger reset than [`crate::WaterfallEngine::reset`] performs.
#[derive(Debug, Default)]
pub struct HeightCache {
    entries: DashMap<ItemId, f32, FxBuildHasher>,
}

impl HeightCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Returns the cached height for `id`, if any.
    pub fn get(&self, id: &ItemId) -> Option<f32> {
        self.entries.get(id).map(|entry| *entry)
    }

    /// Returns whether `id` has a resolved height.
    pub fn contains(&self, id: &ItemId) -> bool {
        self.entries.contains_key(id)
    }

    /// Records the resolved height for `id`.
    pub fn insert(&self, id: ItemId, height: f32) {
        self.entries.insert(id, height);
    }

    /// Number of resolved identities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}
