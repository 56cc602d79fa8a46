//! Column-balanced waterfall layout engine.
//!
//! ## Usage
//!
//! Build a [`WaterfallEngine`], feed it pages of items, and render the
//! resulting column partition. Items land in the currently-shortest
//! column, keeping column heights near-balanced without ever moving an
//! item once placed.
//!
//! ## Examples
//!
//! ```
//! use waterfall_grid::{FeedItem, WaterfallArgs, WaterfallEngine};
//!
//! let mut engine: WaterfallEngine = WaterfallEngine::new(WaterfallArgs::default());
//! engine.initialize(vec![
//!     FeedItem::new(1u64).height(100.0),
//!     FeedItem::new(2u64).height(150.0),
//!     FeedItem::new(3u64).height(50.0),
//! ]);
//!
//! assert_eq!(engine.columns().len(), 2);
//! assert_eq!(engine.len(), 3);
//! ```

use std::sync::Arc;

use derive_setters::Setters;
use tracing::trace;

use crate::{
    height_cache::HeightCache,
    image_probe::{DecodeProber, ImageProbe},
    item::FeedItem,
    resolver::HeightResolver,
};

/// Layout defaults for waterfall feeds.
pub struct WaterfallDefaults;

impl WaterfallDefaults {
    /// Number of columns on a phone-width viewport.
    pub const COLUMN_COUNT: usize = 2;
    /// Gap between consecutive items in a column, in layout units.
    pub const GAP: f32 = 10.0;
    /// Reference container width columns are derived from.
    pub const CONTAINER_WIDTH: f32 = 375.0;
    /// Width one column occupies in the reference container.
    pub const COLUMN_WIDTH: f32 =
        Self::CONTAINER_WIDTH / Self::COLUMN_COUNT as f32 - Self::GAP;
    /// Height assigned when no height source resolves.
    pub const FALLBACK_HEIGHT: f32 = 200.0;
}

/// Arguments for constructing a [`WaterfallEngine`].
#[derive(Clone, Debug, Setters)]
pub struct WaterfallArgs {
    /// Number of vertical tracks items are distributed into. Sanitized to
    /// at least 1. Changing the count mid-session is not supported; build
    /// a new engine instead.
    pub column_count: usize,
    /// Spacing between consecutive items in a column.
    pub gap: f32,
    /// Width probed aspect ratios are scaled against.
    pub column_width: f32,
    /// Height assigned when an item's height cannot be resolved.
    pub fallback_height: f32,
}

impl Default for WaterfallArgs {
    fn default() -> Self {
        Self {
            column_count: WaterfallDefaults::COLUMN_COUNT,
            gap: WaterfallDefaults::GAP,
            column_width: WaterfallDefaults::COLUMN_WIDTH,
            fallback_height: WaterfallDefaults::FALLBACK_HEIGHT,
        }
    }
}

/// An item with its resolved height, placed in a column.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedItem<T> {
    /// The original record, with `height` filled in.
    pub item: FeedItem<T>,
    /// Resolved height in layout units.
    pub height: f32,
}

/// One vertical track of placed items.
///
/// Item order within a column is placement order, which may differ from
/// stream order since neighbors from one batch can land in different
/// columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Column<T> {
    items: Vec<PlacedItem<T>>,
    height: f32,
}

impl<T> Column<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            height: 0.0,
        }
    }

    /// Placed items, in placement order.
    pub fn items(&self) -> &[PlacedItem<T>] {
        &self.items
    }

    /// Running height: item heights plus one gap per placed item.
    pub fn height(&self) -> f32 {
        self.height
    }
}

/// Lifecycle phase of a layout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No items placed.
    Empty,
    /// One or more items placed, no load in flight.
    Populated,
    /// A load is in flight; already-placed items remain valid.
    Loading,
}

/// Stateful waterfall layout session.
///
/// The engine owns the column partition and the height-resolution
/// pipeline. It assumes no UI framework lifecycle: hosts call the
/// mutating methods from their own event handling and re-read
/// [`WaterfallEngine::columns`] when [`WaterfallEngine::revision`]
/// changes.
pub struct WaterfallEngine<T = ()> {
    args: WaterfallArgs,
    columns: Vec<Column<T>>,
    resolver: HeightResolver,
    loading: bool,
    has_more: bool,
    revision: u64,
}

impl<T> WaterfallEngine<T> {
    /// Creates an engine probing local sources with [`DecodeProber`].
    pub fn new(args: WaterfallArgs) -> Self {
        Self::with_prober(args, Arc::new(DecodeProber))
    }

    /// Creates an engine with a host-supplied image prober.
    pub fn with_prober(args: WaterfallArgs, prober: Arc<dyn ImageProbe>) -> Self {
        let resolver = HeightResolver::new(prober, args.column_width, args.fallback_height);
        Self::with_resolver(args, resolver)
    }

    /// Creates an engine around an existing resolver, e.g. to share a
    /// height cache across tab switches that rebuild the engine.
    pub fn with_resolver(args: WaterfallArgs, resolver: HeightResolver) -> Self {
        let column_count = args.column_count.max(1);
        Self {
            columns: (0..column_count).map(|_| Column::new()).collect(),
            args,
            resolver,
            loading: false,
            has_more: true,
            revision: 0,
        }
    }

    /// Replaces the session contents with `items`.
    ///
    /// Columns are rebuilt from scratch, `has_more` returns to its
    /// default, and the batch is resolved and placed. The height cache is
    /// retained: identities seen before place without another probe.
    pub fn initialize(&mut self, items: Vec<FeedItem<T>>)
    where
        T: Sync,
    {
        let column_count = self.columns.len();
        self.columns = (0..column_count).map(|_| Column::new()).collect();
        self.has_more = true;
        self.loading = false;
        if !items.is_empty() {
            self.place_batch(items);
        }
        self.revision += 1;
    }

    /// Equivalent to [`WaterfallEngine::initialize`]; used when a
    /// filter or tab changes.
    pub fn reset(&mut self, items: Vec<FeedItem<T>>)
    where
        T: Sync,
    {
        self.initialize(items);
    }

    /// Places `items` on top of the existing columns.
    ///
    /// Prior placements never move. An empty batch is a no-op that leaves
    /// every observable state, including the revision, untouched.
    pub fn append(&mut self, items: Vec<FeedItem<T>>)
    where
        T: Sync,
    {
        if items.is_empty() {
            trace!("empty append ignored");
            return;
        }
        self.loading = true;
        self.place_batch(items);
        self.loading = false;
        self.revision += 1;
    }

    fn place_batch(&mut self, items: Vec<FeedItem<T>>)
    where
        T: Sync,
    {
        // Resolve the whole batch before placing anything, so placement
        // order matches supplied order regardless of probe timing.
        let heights = self.resolver.resolve_batch(&items);
        for (mut item, height) in items.into_iter().zip(heights) {
            let index = shortest_column(&self.columns);
            trace!(id = %item.id, column = index, height, "placing item");
            item.height = Some(height);
            let column = &mut self.columns[index];
            column.items.push(PlacedItem { item, height });
            column.height += height + self.args.gap;
        }
    }

    /// Sets the externally driven loading flag.
    pub fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.revision += 1;
        }
    }

    /// Sets the externally driven more-data flag, typically from a
    /// server-reported `has_more`.
    pub fn set_has_more(&mut self, has_more: bool) {
        if self.has_more != has_more {
            self.has_more = has_more;
            self.revision += 1;
        }
    }

    /// The column partition, for rendering.
    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    /// Total number of placed items.
    pub fn len(&self) -> usize {
        self.columns.iter().map(|column| column.items.len()).sum()
    }

    /// Returns whether no items are placed.
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|column| column.items.is_empty())
    }

    /// Whether a load is in flight.
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Whether the data source reported more pages.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        if self.loading {
            SessionPhase::Loading
        } else if self.is_empty() {
            SessionPhase::Empty
        } else {
            SessionPhase::Populated
        }
    }

    /// Monotonic counter bumped on every observable state change. Hosts
    /// poll this to decide when to re-render.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Construction arguments.
    pub fn args(&self) -> &WaterfallArgs {
        &self.args
    }

    /// The shared height cache.
    pub fn height_cache(&self) -> &Arc<HeightCache> {
        self.resolver.cache()
    }

    /// Warms the height cache for `items` on a background thread, so a
    /// later [`WaterfallEngine::append`] places them without probe
    /// latency. Items already resolved or without an image are skipped.
    pub fn prefetch(&self, items: &[FeedItem<T>]) -> std::thread::JoinHandle<()> {
        let entries = items
            .iter()
            .filter(|item| item.height.is_none())
            .filter_map(|item| {
                item.image
                    .as_ref()
                    .map(|source| (item.id.clone(), source.clone()))
            })
            .collect();
        self.resolver.prefetch(entries)
    }
}

/// Index of the column with minimal running height, ties to the lowest
/// index.
fn shortest_column<T>(columns: &[Column<T>]) -> usize {
    let mut index = 0;
    let mut best = columns.first().map(|column| column.height).unwrap_or(0.0);
    for (i, column) in columns.iter().enumerate().skip(1) {
        if column.height < best {
            best = column.height;
            index = i;
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        image_probe::ImageSource,
        item::ItemId,
        test_probe::{FailProber, FixedProber},
    };

    fn sized_items(heights: &[(u64, f32)]) -> Vec<FeedItem> {
        heights
            .iter()
            .map(|&(id, height)| FeedItem::new(id).height(height))
            .collect()
    }

    fn column_ids(column: &Column<()>) -> Vec<ItemId> {
        column
            .items()
            .iter()
            .map(|placed| placed.item.id.clone())
            .collect()
    }

    fn remote(url: &str) -> ImageSource {
        ImageSource::Remote(url.to_string())
    }

    #[test]
    fn test_initialize_creates_exact_column_count() {
        for count in [1, 2, 3, 7] {
            let mut engine: WaterfallEngine =
                WaterfallEngine::new(WaterfallArgs::default().column_count(count));
            engine.initialize(Vec::new());
            assert_eq!(engine.columns().len(), count);
            assert!(engine.columns().iter().all(|c| c.items().is_empty()));
        }
    }

    #[test]
    fn test_zero_column_count_sanitized() {
        let engine: WaterfallEngine =
            WaterfallEngine::new(WaterfallArgs::default().column_count(0));
        assert_eq!(engine.columns().len(), 1);
    }

    #[test]
    fn test_seed_scenario_step_by_step() {
        // Three items, two columns, gap 10. Trace of the greedy rule:
        // item 1 (100): both columns at 0, tie -> col 0, col 0 = 110.
        // item 2 (150): col 1 at 0 is shortest -> col 1, col 1 = 160.
        // item 3 (50): col 0 at 110 < col 1 at 160 -> col 0, col 0 = 170.
        let mut engine: WaterfallEngine = WaterfallEngine::new(WaterfallArgs::default());
        engine.initialize(sized_items(&[(1, 100.0), (2, 150.0), (3, 50.0)]));

        let columns = engine.columns();
        assert_eq!(
            column_ids(&columns[0]),
            vec![ItemId::Number(1), ItemId::Number(3)]
        );
        assert_eq!(column_ids(&columns[1]), vec![ItemId::Number(2)]);
        assert_eq!(columns[0].height(), 170.0);
        assert_eq!(columns[1].height(), 160.0);
        assert_eq!(engine.phase(), SessionPhase::Populated);
    }

    #[test]
    fn test_tie_breaks_to_lowest_index() {
        let mut engine: WaterfallEngine =
            WaterfallEngine::new(WaterfallArgs::default().column_count(3));
        engine.initialize(sized_items(&[(1, 100.0)]));
        assert_eq!(engine.columns()[0].items().len(), 1);
        assert!(engine.columns()[1].items().is_empty());
        assert!(engine.columns()[2].items().is_empty());
    }

    #[test]
    fn test_greedy_monotonicity() {
        let mut engine: WaterfallEngine = WaterfallEngine::new(WaterfallArgs::default());
        engine.initialize(sized_items(&[(1, 100.0), (2, 150.0)]));

        let before: Vec<f32> = engine.columns().iter().map(|c| c.height()).collect();
        let shortest = before
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();

        engine.append(sized_items(&[(3, 40.0)]));
        let after: Vec<f32> = engine.columns().iter().map(|c| c.height()).collect();
        assert_eq!(after[shortest], before[shortest] + 40.0 + WaterfallDefaults::GAP);
        for i in 0..before.len() {
            if i != shortest {
                assert_eq!(after[i], before[i]);
            }
        }
    }

    #[test]
    fn test_completeness_across_initialize_and_append() {
        let mut engine: WaterfallEngine = WaterfallEngine::new(WaterfallArgs::default());
        engine.initialize(sized_items(&[(1, 100.0), (2, 150.0), (3, 50.0)]));
        engine.append(sized_items(&[(4, 80.0), (5, 220.0)]));

        let mut ids: Vec<ItemId> = engine
            .columns()
            .iter()
            .flat_map(|column| column_ids(column))
            .collect();
        ids.sort();
        assert_eq!(
            ids,
            (1u64..=5).map(ItemId::Number).collect::<Vec<_>>()
        );
        assert_eq!(engine.len(), 5);
    }

    #[test]
    fn test_append_preserves_prior_placement() {
        let mut engine: WaterfallEngine = WaterfallEngine::new(WaterfallArgs::default());
        engine.initialize(sized_items(&[(1, 100.0), (2, 150.0), (3, 50.0)]));

        let before: Vec<Vec<ItemId>> =
            engine.columns().iter().map(|c| column_ids(c)).collect();

        engine.append(sized_items(&[(4, 80.0)]));

        for (column, prior) in engine.columns().iter().zip(&before) {
            let current = column_ids(column);
            assert_eq!(&current[..prior.len()], &prior[..]);
        }
    }

    #[test]
    fn test_append_empty_is_noop() {
        let mut engine: WaterfallEngine = WaterfallEngine::new(WaterfallArgs::default());
        engine.initialize(sized_items(&[(1, 100.0)]));

        let revision = engine.revision();
        let columns = engine.columns().to_vec();
        engine.append(Vec::new());

        assert_eq!(engine.revision(), revision);
        assert_eq!(engine.columns(), &columns[..]);
        assert!(!engine.loading());
    }

    #[test]
    fn test_reset_empty_clears_columns_keeps_cache() {
        let mut engine: WaterfallEngine = WaterfallEngine::new(WaterfallArgs::default());
        engine.initialize(sized_items(&[(1, 100.0), (2, 150.0)]));
        engine.set_has_more(false);
        assert_eq!(engine.height_cache().len(), 2);

        engine.reset(Vec::new());

        assert_eq!(engine.columns().len(), 2);
        assert!(engine.is_empty());
        assert!(engine.has_more());
        assert_eq!(engine.phase(), SessionPhase::Empty);
        assert_eq!(engine.height_cache().len(), 2);
    }

    #[test]
    fn test_placed_items_always_carry_height() {
        let mut engine: WaterfallEngine = WaterfallEngine::with_prober(
            WaterfallArgs::default(),
            Arc::new(FailProber::new()),
        );
        engine.initialize(vec![
            FeedItem::new(1u64).height(100.0),
            FeedItem::new(2u64).image(remote("broken.jpg")),
            FeedItem::new(3u64),
        ]);

        for column in engine.columns() {
            for placed in column.items() {
                assert_eq!(placed.item.height, Some(placed.height));
            }
        }
    }

    #[test]
    fn test_fallback_height_on_probe_failure() {
        let args = WaterfallArgs::default().fallback_height(222.0);
        let mut engine: WaterfallEngine =
            WaterfallEngine::with_prober(args, Arc::new(FailProber::new()));
        engine.initialize(vec![FeedItem::new(1u64).image(remote("broken.jpg"))]);
        assert_eq!(engine.columns()[0].items()[0].height, 222.0);
    }

    #[test]
    fn test_probed_height_scales_to_column_width() {
        let args = WaterfallArgs::default().column_width(180.0);
        let mut engine: WaterfallEngine =
            WaterfallEngine::with_prober(args, Arc::new(FixedProber::new(400, 800)));
        engine.initialize(vec![FeedItem::new(1u64).image(remote("a.jpg"))]);
        assert_eq!(engine.columns()[0].items()[0].height, 360.0);
    }

    #[test]
    fn test_same_identity_probed_once_across_calls() {
        let prober = Arc::new(FixedProber::new(400, 800));
        let mut engine: WaterfallEngine =
            WaterfallEngine::with_prober(WaterfallArgs::default(), prober.clone());

        engine.initialize(vec![FeedItem::new(1u64).image(remote("a.jpg"))]);
        engine.append(vec![FeedItem::new(1u64).image(remote("a.jpg"))]);
        engine.reset(vec![FeedItem::new(1u64).image(remote("a.jpg"))]);

        assert_eq!(prober.count(), 1);
    }

    #[test]
    fn test_flag_setters_bump_revision_once() {
        let mut engine: WaterfallEngine = WaterfallEngine::new(WaterfallArgs::default());
        let revision = engine.revision();

        engine.set_loading(true);
        assert_eq!(engine.revision(), revision + 1);
        assert_eq!(engine.phase(), SessionPhase::Loading);
        engine.set_loading(true);
        assert_eq!(engine.revision(), revision + 1);

        engine.set_has_more(false);
        assert!(!engine.has_more());
        assert_eq!(engine.revision(), revision + 2);
    }

    #[test]
    fn test_prefetch_lets_append_place_without_probing() {
        let prober = Arc::new(FixedProber::new(400, 800));
        let mut engine: WaterfallEngine =
            WaterfallEngine::with_prober(WaterfallArgs::default(), prober.clone());

        let page = vec![
            FeedItem::new(1u64).image(remote("a.jpg")),
            FeedItem::new(2u64).image(remote("b.jpg")),
        ];
        engine.prefetch(&page).join().unwrap();
        assert_eq!(prober.count(), 2);

        engine.append(page);
        assert_eq!(prober.count(), 2);
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_extra_payload_passes_through() {
        let mut engine: WaterfallEngine<&str> =
            WaterfallEngine::new(WaterfallArgs::default());
        engine.initialize(vec![
            FeedItem::with_extra(1u64, "West Lake").height(100.0),
            FeedItem::with_extra(2u64, "The Bund").height(150.0),
        ]);
        assert_eq!(engine.columns()[0].items()[0].item.extra, "West Lake");
        assert_eq!(engine.columns()[1].items()[0].item.extra, "The Bund");
    }
}
