//! Scroll position to playback progress.
//!
//! The showcase pins the canvas while a tall virtual region scrolls past;
//! raw progress is the fraction of that region already consumed. The
//! smoothed value springs toward the raw value and is what frame selection
//! reads. Both are readable synchronously at any time.

use crate::scroll::spring::{Spring, SpringConfig};

/// Virtual scroll region length in viewport heights. The pinned canvas
/// stays on screen while the remaining five viewport-heights scroll by.
pub const REGION_VIEWPORT_HEIGHTS: f64 = 6.0;

#[derive(Debug)]
pub struct ScrollProgressSource {
    /// Scrollable span in pixels (region height minus one viewport).
    span: f64,
    offset: f64,
    spring: Spring,
}

impl ScrollProgressSource {
    pub fn new(viewport_height: f64) -> Self {
        Self::with_config(viewport_height, SpringConfig::default())
    }

    pub fn with_config(viewport_height: f64, config: SpringConfig) -> Self {
        Self {
            span: Self::span_for(viewport_height),
            offset: 0.0,
            spring: Spring::new(config),
        }
    }

    fn span_for(viewport_height: f64) -> f64 {
        (viewport_height * (REGION_VIEWPORT_HEIGHTS - 1.0)).max(1.0)
    }

    /// Viewport resized: progress fraction is preserved, the pixel span
    /// is recomputed.
    pub fn set_viewport_height(&mut self, viewport_height: f64) {
        let progress = self.raw();
        self.span = Self::span_for(viewport_height);
        self.offset = progress * self.span;
    }

    /// Absolute scroll offset in pixels, clamped to the region.
    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset.clamp(0.0, self.span);
        self.spring.set_target(self.raw());
    }

    /// Relative scroll (wheel/touchpad delta already converted to pixels).
    pub fn scroll_by(&mut self, delta: f64) {
        self.set_offset(self.offset + delta);
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Unsmoothed progress in [0, 1].
    pub fn raw(&self) -> f64 {
        (self.offset / self.span).clamp(0.0, 1.0)
    }

    /// Spring-filtered progress. May transiently overshoot [0, 1]; the
    /// frame mapper clamps.
    pub fn smoothed(&self) -> f64 {
        self.spring.value()
    }

    /// Advance the spring by one animation-frame tick.
    pub fn tick(&mut self, dt: f64) -> f64 {
        self.spring.tick(dt)
    }

    /// Reset to the top of the region with no residual motion. Used on
    /// product switch so the new sequence starts on frame 0.
    pub fn reset(&mut self) {
        self.offset = 0.0;
        self.spring.snap_to(0.0);
    }
}
