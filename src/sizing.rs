//! Viewport-derived sizing and image URL helpers for waterfall feeds.
//!
//! ## Usage
//!
//! Derive column geometry from the viewport, request appropriately sized
//! renditions from object-storage CDNs, and estimate placeholder heights
//! before an image has been probed.

/// Defaults for viewport-derived sizing.
pub struct SizingDefaults;

impl SizingDefaults {
    /// Viewport width above which the feed uses three columns.
    pub const WIDE_VIEWPORT: f32 = 768.0;
    /// Column count for wide viewports.
    pub const WIDE_COLUMN_COUNT: usize = 3;
    /// Column count for narrow (phone) viewports.
    pub const NARROW_COLUMN_COUNT: usize = 2;
    /// Height-to-width ratio assumed when nothing better is known.
    pub const DEFAULT_ASPECT: f32 = 0.75;
}

/// Column count for a viewport width: three above the wide breakpoint,
/// two otherwise.
pub fn column_count_for(viewport_width: f32) -> usize {
    if viewport_width > SizingDefaults::WIDE_VIEWPORT {
        SizingDefaults::WIDE_COLUMN_COUNT
    } else {
        SizingDefaults::NARROW_COLUMN_COUNT
    }
}

/// Width one column occupies in a viewport, after the inter-column gap.
pub fn column_width_for(viewport_width: f32, column_count: usize, gap: f32) -> f32 {
    viewport_width / column_count.max(1) as f32 - gap
}

/// Pixel width to request from an image service for one column,
/// accounting for the device pixel ratio.
pub fn probe_width(viewport_width: f32, pixel_ratio: f32) -> u32 {
    let columns = column_count_for(viewport_width);
    (viewport_width / columns as f32 * pixel_ratio.max(1.0)).floor() as u32
}

/// Rewrites an image URL to request a `width`-pixel webp rendition from
/// known object-storage hosts. Data URLs, already-rewritten URLs, and
/// unknown hosts pass through unchanged.
pub fn optimized_url(url: &str, width: u32) -> String {
    if url.is_empty() || url.starts_with("data:") || url.contains("?x-oss-process=") {
        return url.to_string();
    }

    if url.contains("aliyuncs.com") {
        return format!("{url}?x-oss-process=image/resize,w_{width}/format,webp/quality,q_75");
    }

    if url.contains("myqcloud.com") || url.contains("qiniucdn.com") {
        return format!("{url}?imageView2/2/w/{width}/format/webp/q/75");
    }

    url.to_string()
}

/// Extracts intrinsic dimensions from a `<width>x<height>` token embedded
/// in a URL, a convention of several image services.
pub fn dimensions_in_url(url: &str) -> Option<(u32, u32)> {
    let bytes = url.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'x' && b != b'X' {
            continue;
        }
        let before = bytes[..i]
            .iter()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .count();
        let after = bytes[i + 1..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .count();
        if before == 0 || after == 0 {
            continue;
        }
        let width = url[i - before..i].parse::<u32>().ok();
        let height = url[i + 1..i + 1 + after].parse::<u32>().ok();
        if let (Some(width), Some(height)) = (width, height) {
            return Some((width, height));
        }
    }
    None
}

/// Estimated display height for an image scaled to `width` layout units,
/// from URL-embedded dimensions when present, else the default 4:3
/// aspect. Suited to sizing skeletons and placeholders; placement uses
/// the resolver's probed heights instead.
pub fn estimate_height(url: &str, width: f32) -> f32 {
    match dimensions_in_url(url) {
        Some((w, h)) if w > 0 => (width * h as f32 / w as f32).floor(),
        _ => (width * SizingDefaults::DEFAULT_ASPECT).floor(),
    }
}
