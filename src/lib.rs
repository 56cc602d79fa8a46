//! Column-balanced waterfall layout for incremental content feeds.
//!
//! The engine assigns an ordered stream of variable-height items to a
//! fixed set of columns, greedily keeping column heights near-balanced.
//! Heights come from the item itself, from probing an image's intrinsic
//! size, or from a fallback, and are cached by item identity so pages
//! that revisit an item never probe twice. A companion controller turns
//! sentinel visibility into load-more requests.
//!
//! # Usage
//!
//! ```
//! use waterfall_grid::{
//!     FeedItem, LoadMoreArgs, LoadMoreController, WaterfallArgs, WaterfallEngine,
//! };
//!
//! // Two columns, the mobile default.
//! let mut engine: WaterfallEngine = WaterfallEngine::new(WaterfallArgs::default());
//! engine.initialize(vec![
//!     FeedItem::new(1u64).height(100.0),
//!     FeedItem::new(2u64).height(150.0),
//!     FeedItem::new(3u64).height(50.0),
//! ]);
//!
//! // Render the partition however the host likes.
//! for column in engine.columns() {
//!     for placed in column.items() {
//!         let _ = (&placed.item.id, placed.height);
//!     }
//! }
//!
//! // Ask for the next page once the sentinel scrolls near the viewport.
//! let load_more = LoadMoreController::new(LoadMoreArgs::default());
//! if load_more.observe(640.0, 660.0, 600.0, engine.has_more(), engine.loading()) {
//!     engine.append(vec![FeedItem::new(4u64).height(80.0)]);
//! }
//! assert_eq!(engine.len(), 4);
//! ```
//!
//! Hosts with real image feeds construct the engine with
//! [`WaterfallEngine::with_prober`], plugging their image loading
//! facility into the [`image_probe::ImageProbe`] seam; probe failures
//! degrade to the configured fallback height and never fail a layout
//! pass.

pub mod engine;
pub mod height_cache;
pub mod image_probe;
pub mod item;
pub mod load_more;
pub mod resolver;
pub mod sizing;

#[cfg(test)]
mod test_probe;

pub use engine::{
    Column, PlacedItem, SessionPhase, WaterfallArgs, WaterfallDefaults, WaterfallEngine,
};
pub use height_cache::HeightCache;
pub use image_probe::{DecodeProber, ImageDimensions, ImageProbe, ImageSource, ProbeError};
pub use item::{FeedItem, ItemId};
pub use load_more::{LoadMoreArgs, LoadMoreController, LoadMoreDefaults};
pub use resolver::HeightResolver;
