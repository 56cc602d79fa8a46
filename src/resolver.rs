//! Height resolution with caching, probing, and fallback.
//!
//! ## Usage
//!
//! A [`HeightResolver`] turns feed items into concrete heights before
//! placement. Resolution never fails: anything that cannot be probed
//! degrades to the configured fallback height.

use std::{sync::Arc, thread};

use rayon::prelude::*;
use tracing::debug;

use crate::{
    height_cache::HeightCache,
    image_probe::{ImageProbe, ImageSource},
    item::{FeedItem, ItemId},
};

/// Resolves concrete heights for feed items.
///
/// Resolution order per item: cached value, explicit height, probed
/// intrinsic size scaled to the column width, fallback height. Every
/// outcome is recorded in the shared [`HeightCache`], keyed by item
/// identity.
pub struct HeightResolver {
    cache: Arc<HeightCache>,
    prober: Arc<dyn ImageProbe>,
    column_width: f32,
    fallback_height: f32,
}

impl HeightResolver {
    /// Creates a resolver with a fresh cache.
    pub fn new(prober: Arc<dyn ImageProbe>, column_width: f32, fallback_height: f32) -> Self {
        Self::with_cache(Arc::new(HeightCache::new()), prober, column_width, fallback_height)
    }

    /// Creates a resolver sharing an existing cache, e.g. across tab
    /// switches that rebuild the engine.
    pub fn with_cache(
        cache: Arc<HeightCache>,
        prober: Arc<dyn ImageProbe>,
        column_width: f32,
        fallback_height: f32,
    ) -> Self {
        Self {
            cache,
            prober,
            column_width,
            fallback_height,
        }
    }

    /// The shared height cache.
    pub fn cache(&self) -> &Arc<HeightCache> {
        &self.cache
    }

    /// Width probed aspect ratios are scaled against.
    pub fn column_width(&self) -> f32 {
        self.column_width
    }

    /// Height used when no height source resolves.
    pub fn fallback_height(&self) -> f32 {
        self.fallback_height
    }

    /// Resolves the height of a single item.
    ///
    /// Never errors; probe failures and missing height sources resolve to
    /// the fallback height and are logged at debug level only.
    pub fn resolve<T>(&self, item: &FeedItem<T>) -> f32 {
        if let Some(height) = self.cache.get(&item.id) {
            return height;
        }

        if let Some(height) = item.height {
            self.cache.insert(item.id.clone(), height);
            return height;
        }

        let Some(source) = &item.image else {
            debug!(id = %item.id, "no height source, using fallback height");
            self.cache.insert(item.id.clone(), self.fallback_height);
            return self.fallback_height;
        };

        let height = match self.prober.probe(source) {
            Ok(dims) => match dims.height_at_width(self.column_width) {
                Some(height) => height,
                None => {
                    debug!(id = %item.id, "probed zero-width image, using fallback height");
                    self.fallback_height
                }
            },
            Err(err) => {
                debug!(id = %item.id, error = %err, "image probe failed, using fallback height");
                self.fallback_height
            }
        };
        self.cache.insert(item.id.clone(), height);
        height
    }

    /// Resolves a whole batch, preserving input order.
    ///
    /// Probes fan out across rayon workers, but the returned heights line
    /// up index-for-index with `items`, so placement stays deterministic
    /// regardless of probe timing.
    pub fn resolve_batch<T: Sync>(&self, items: &[FeedItem<T>]) -> Vec<f32> {
        items.par_iter().map(|item| self.resolve(item)).collect()
    }

    /// Warms the cache for upcoming items on a background thread.
    ///
    /// Only successful probes are recorded; failures are left for
    /// [`HeightResolver::resolve`] to handle at placement time. Entries
    /// already resolved are skipped. Supply entries in priority order.
    /// The returned handle may be dropped to let the warm-up run
    /// detached.
    pub fn prefetch(&self, entries: Vec<(ItemId, ImageSource)>) -> thread::JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        let prober = Arc::clone(&self.prober);
        let column_width = self.column_width;
        thread::spawn(move || {
            for (id, source) in entries {
                if cache.contains(&id) {
                    continue;
                }
                match prober.probe(&source) {
                    Ok(dims) => {
                        if let Some(height) = dims.height_at_width(column_width) {
                            cache.insert(id, height);
                        }
                    }
                    Err(err) => {
                        debug!(id = %id, error = %err, "prefetch probe failed");
                    }
                }
            }
        })
    }
}
