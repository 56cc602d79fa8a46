//! Content records placed by the waterfall engine.

use std::fmt;

use crate::image_probe::ImageSource;

/// Stable identity of a feed item.
///
/// Identities are unique within the active item set and key the shared
/// height cache, so an item that reappears in a later page resolves its
/// height without another probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemId {
    /// Numeric identity, e.g. a database row id.
    Number(u64),
    /// Textual identity, e.g. a UUID or slug.
    Text(String),
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for ItemId {
    fn from(value: u32) -> Self {
        Self::Number(value as u64)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// A content record to be placed in the layout.
///
/// Only `id`, `image`, and `height` are layout-relevant. Everything else a
/// feed carries (title, author, like counts, …) travels in `extra`, which
/// the engine passes through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem<T = ()> {
    /// Identity, unique within the active item set.
    pub id: ItemId,
    /// Locator probed for intrinsic size when no explicit height is given.
    pub image: Option<ImageSource>,
    /// Externally supplied height in layout units. Authoritative when
    /// present; no probing occurs.
    pub height: Option<f32>,
    /// Opaque display payload.
    pub extra: T,
}

impl FeedItem<()> {
    /// Creates a record with no image, no height, and no payload.
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self::with_extra(id, ())
    }
}

impl<T> FeedItem<T> {
    /// Creates a record carrying an opaque display payload.
    pub fn with_extra(id: impl Into<ItemId>, extra: T) -> Self {
        Self {
            id: id.into(),
            image: None,
            height: None,
            extra,
        }
    }

    /// Sets the image locator used for intrinsic-size probing.
    pub fn image(mut self, source: ImageSource) -> Self {
        self.image = Some(source);
        self
    }

    /// Sets an explicit height, skipping probing entirely.
    pub fn height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }
}
