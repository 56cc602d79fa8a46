//! Visibility-triggered pagination for incremental feeds.
//!
//! ## Usage
//!
//! Place a sentinel element after the last rendered item and report its
//! position to a [`LoadMoreController`] whenever the viewport changes.
//! The controller decides when the host should request the next page; it
//! holds no item or column state of its own.
//!
//! ## Examples
//!
//! ```
//! use waterfall_grid::{LoadMoreArgs, LoadMoreController};
//!
//! let controller = LoadMoreController::new(LoadMoreArgs::default());
//!
//! // Sentinel sits 40 units below a 600-unit viewport: within the
//! // default 100-unit margin, so the next page should load.
//! assert!(controller.observe(640.0, 660.0, 600.0, true, false));
//! // Still visible, already triggered: no duplicate request.
//! assert!(!controller.observe(640.0, 660.0, 600.0, true, false));
//! ```

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use derive_setters::Setters;
use parking_lot::Mutex;
use tracing::debug;

/// Defaults for load-more triggering.
pub struct LoadMoreDefaults;

impl LoadMoreDefaults {
    /// Fraction of the sentinel that must be visible to count as
    /// intersecting.
    pub const THRESHOLD: f32 = 0.1;
    /// Margin around the viewport treated as visible, in layout units.
    /// Lets the next page start loading shortly before the sentinel
    /// scrolls into view.
    pub const MARGIN: f32 = 100.0;
    /// Minimum interval between consecutive triggers.
    pub const COOLDOWN: Duration = Duration::from_millis(300);
}

/// Arguments for constructing a [`LoadMoreController`].
#[derive(Clone, Setters)]
pub struct LoadMoreArgs {
    /// Visible-fraction threshold for the sentinel to count as visible.
    pub threshold: f32,
    /// Margin around the viewport treated as visible.
    pub margin: f32,
    /// Minimum interval between consecutive triggers, guarding against
    /// visibility flicker at the viewport edge.
    pub cooldown: Duration,
    /// Invoked when the next page should load.
    #[setters(strip_option)]
    pub on_load_more: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl Default for LoadMoreArgs {
    fn default() -> Self {
        Self {
            threshold: LoadMoreDefaults::THRESHOLD,
            margin: LoadMoreDefaults::MARGIN,
            cooldown: LoadMoreDefaults::COOLDOWN,
            on_load_more: None,
        }
    }
}

struct LoadMoreState {
    visible: bool,
    armed: bool,
    last_fired: Option<Instant>,
}

impl LoadMoreState {
    fn new() -> Self {
        Self {
            visible: false,
            armed: true,
            last_fired: None,
        }
    }
}

/// Decides when an incremental feed should request its next page.
///
/// Fires at most once per visibility transition: after a trigger the
/// controller disarms until the sentinel leaves the viewport, or until a
/// load is observed in flight (so back-to-back pages chain when the
/// sentinel stays visible). A cooldown suppresses duplicate triggers
/// from rapid visibility flicker. Methods take `&self`; the controller
/// can be shared with host event closures behind an `Arc`.
pub struct LoadMoreController {
    args: LoadMoreArgs,
    state: Mutex<LoadMoreState>,
}

impl LoadMoreController {
    /// Creates a controller.
    pub fn new(args: LoadMoreArgs) -> Self {
        Self {
            args,
            state: Mutex::new(LoadMoreState::new()),
        }
    }

    /// Construction arguments.
    pub fn args(&self) -> &LoadMoreArgs {
        &self.args
    }

    /// Visible fraction of a sentinel spanning `sentinel_start..
    /// sentinel_end` (viewport coordinates) within the viewport expanded
    /// by the configured margin.
    pub fn visibility(&self, sentinel_start: f32, sentinel_end: f32, viewport_extent: f32) -> f32 {
        visible_fraction(
            sentinel_start,
            sentinel_end,
            viewport_extent,
            self.args.margin,
        )
    }

    /// Reports sentinel geometry plus the consumer gate, returning
    /// whether the host should request the next page. Invokes the
    /// registered callback when triggering.
    pub fn observe(
        &self,
        sentinel_start: f32,
        sentinel_end: f32,
        viewport_extent: f32,
        has_more: bool,
        loading: bool,
    ) -> bool {
        let fraction = self.visibility(sentinel_start, sentinel_end, viewport_extent);
        self.on_visibility(fraction >= self.args.threshold, has_more, loading)
    }

    /// Reports a precomputed visibility verdict, for hosts with their own
    /// intersection logic.
    pub fn on_visibility(&self, visible: bool, has_more: bool, loading: bool) -> bool {
        self.on_visibility_at(visible, has_more, loading, Instant::now())
    }

    /// Forgets visibility and cooldown state, e.g. after a tab switch
    /// resets the feed.
    pub fn reset(&self) {
        *self.state.lock() = LoadMoreState::new();
    }

    fn on_visibility_at(&self, visible: bool, has_more: bool, loading: bool, now: Instant) -> bool {
        let triggered = {
            let mut state = self.state.lock();
            if !visible {
                state.visible = false;
                state.armed = true;
                return false;
            }
            state.visible = true;
            if loading {
                // The in-flight load consumed the previous trigger; once
                // it settles, a still-visible sentinel may request the
                // next page.
                state.armed = true;
                return false;
            }
            if !has_more || !state.armed {
                return false;
            }
            let cooled_down = state
                .last_fired
                .map(|last| now.duration_since(last) >= self.args.cooldown)
                .unwrap_or(true);
            if !cooled_down {
                return false;
            }
            state.armed = false;
            state.last_fired = Some(now);
            true
        };
        // Lock released before the callback; it may re-enter the
        // controller.
        if triggered {
            debug!("load-more triggered");
            if let Some(callback) = &self.args.on_load_more {
                callback();
            }
        }
        triggered
    }
}

fn visible_fraction(start: f32, end: f32, viewport_extent: f32, margin: f32) -> f32 {
    let lo = -margin;
    let hi = viewport_extent + margin;
    let extent = end - start;
    if extent <= 0.0 {
        // Degenerate sentinel: visible iff its position lies inside.
        return if start >= lo && start <= hi { 1.0 } else { 0.0 };
    }
    let overlap = (end.min(hi) - start.max(lo)).max(0.0);
    overlap / extent
}
