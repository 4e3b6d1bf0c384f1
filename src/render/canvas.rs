//! Letterbox fit math and draw planning.
//!
//! The renderer is pure planning: given the frame storage and a requested
//! index it produces a `DrawOp` (which frame, where, how big) in surface
//! pixel coordinates. The GTK widget executes the op; everything here is
//! testable without a display.

use tracing::trace;

use crate::models::{FrameImage, FrameSet, Visuals};

/// High-DPI surfaces are capped at 2x to bound GPU/memory cost.
pub const DPR_CAP: f64 = 2.0;

/// Internal drawing-surface resolution for a logical viewport size.
pub fn surface_size(logical_width: f64, logical_height: f64, device_pixel_ratio: f64) -> (u32, u32) {
    let dpr = device_pixel_ratio.min(DPR_CAP).max(0.0);
    (
        (logical_width * dpr).round().max(0.0) as u32,
        (logical_height * dpr).round().max(0.0) as u32,
    )
}

/// Extra zoom applied on constrained (narrow/tall) viewports so the subject
/// fills the frame instead of floating in letterbox. Art direction, not
/// algorithm: tiers are configuration.
#[derive(Debug, Clone)]
pub struct ViewportPolicy {
    /// `(max_aspect, multiplier)` tiers, checked in order; first tier whose
    /// bound exceeds the viewport aspect wins.
    tiers: Vec<(f64, f64)>,
    /// Multiplier when no tier matches.
    base: f64,
}

impl ViewportPolicy {
    pub fn new(tiers: Vec<(f64, f64)>, base: f64) -> Self {
        Self { tiers, base }
    }

    /// No adjustment; used for regular desktop viewports.
    pub fn neutral() -> Self {
        Self::new(Vec::new(), 1.0)
    }

    /// Portrait phones get the strongest zoom.
    pub fn constrained_default() -> Self {
        Self::new(vec![(0.6, 1.8)], 1.5)
    }

    pub fn multiplier(&self, viewport_aspect: f64) -> f64 {
        for &(max_aspect, multiplier) in &self.tiers {
            if viewport_aspect < max_aspect {
                return multiplier;
            }
        }
        self.base
    }
}

/// Destination rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One planned draw: blit `frame_index` into `rect`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawOp {
    pub frame_index: usize,
    pub rect: DrawRect,
}

/// Contain-fit with per-product adjustments, in surface pixel space.
pub fn fit_rect(
    canvas_width: f64,
    canvas_height: f64,
    image: &FrameImage,
    visuals: &Visuals,
    extra_scale: f64,
) -> DrawRect {
    let canvas_ratio = canvas_width / canvas_height;
    let img_ratio = image.aspect_ratio();

    let (mut draw_width, mut draw_height) = if img_ratio > canvas_ratio {
        (canvas_width, canvas_width / img_ratio)
    } else {
        (canvas_height * img_ratio, canvas_height)
    };

    let scale = visuals.scale * extra_scale;
    draw_width *= scale;
    draw_height *= scale;

    let x = (canvas_width - draw_width) / 2.0;
    let y = (canvas_height - draw_height) / 2.0 + visuals.y_offset * canvas_height;

    DrawRect {
        x,
        y,
        width: draw_width,
        height: draw_height,
    }
}

/// Per-sequence draw planner with redundant-draw suppression.
pub struct CanvasRenderer {
    width: f64,
    height: f64,
    last_drawn: Option<usize>,
    policy: ViewportPolicy,
}

impl CanvasRenderer {
    pub fn new(policy: ViewportPolicy) -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            last_drawn: None,
            policy,
        }
    }

    pub fn set_policy(&mut self, policy: ViewportPolicy) {
        self.policy = policy;
        self.last_drawn = None;
    }

    /// Update the surface pixel dimensions. A genuine size change
    /// invalidates the suppression cache (exactly once) so the next plan
    /// redraws at the new resolution.
    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        let (w, h) = (width as f64, height as f64);
        if (w - self.width).abs() > f64::EPSILON || (h - self.height).abs() > f64::EPSILON {
            self.width = w;
            self.height = h;
            self.last_drawn = None;
            trace!(width, height, "Canvas surface resized");
        }
    }

    pub fn surface_dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Force the next plan to draw even for a repeated index. Used when a
    /// newly decoded frame should replace a fallback already on screen.
    pub fn invalidate(&mut self) {
        self.last_drawn = None;
    }

    pub fn last_drawn(&self) -> Option<usize> {
        self.last_drawn
    }

    /// Nearest-available resolution: the exact frame if loaded, else the
    /// closest loaded frame strictly below. Never scans forward - later
    /// frames are content the scroll position has not reached yet.
    pub fn resolve<'a>(frames: &'a FrameSet, index: usize) -> Option<(usize, &'a FrameImage)> {
        let start = index.min(frames.len().checked_sub(1)?);
        (0..=start)
            .rev()
            .find_map(|i| frames.image(i).map(|img| (i, img)))
    }

    /// Plan a draw of `index`. Returns `None` when nothing should be drawn:
    /// repeated index (suppression), zero-sized surface, or no loaded frame
    /// at or below the index (previous content stays on screen).
    pub fn plan(&mut self, frames: &FrameSet, index: usize, visuals: &Visuals) -> Option<DrawOp> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        if self.last_drawn == Some(index) {
            return None;
        }
        self.last_drawn = Some(index);

        let (resolved, image) = Self::resolve(frames, index)?;
        let extra = self.policy.multiplier(self.width / self.height);
        let rect = fit_rect(self.width, self.height, image, visuals, extra);
        Some(DrawOp {
            frame_index: resolved,
            rect,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u32, height: u32) -> FrameImage {
        FrameImage::new(width, height, vec![0u8; (width * height * 4) as usize])
    }

    fn loaded_set(frame_count: usize, loaded: &[usize]) -> FrameSet {
        let mut set = FrameSet::new(frame_count);
        for &i in loaded {
            set.set_loaded(i, image(160, 90));
        }
        set
    }

    #[test]
    fn surface_size_caps_device_pixel_ratio() {
        assert_eq!(surface_size(800.0, 600.0, 1.0), (800, 600));
        assert_eq!(surface_size(800.0, 600.0, 3.0), (1600, 1200));
        assert_eq!(surface_size(800.0, 600.0, 1.5), (1200, 900));
    }

    #[test]
    fn wide_image_fits_to_width() {
        let img = image(200, 50); // ratio 4.0
        let rect = fit_rect(800.0, 600.0, &img, &Visuals::default(), 1.0);
        assert_eq!(rect.width, 800.0);
        assert_eq!(rect.height, 200.0);
        assert_eq!(rect.x, 0.0);
        assert_eq!(rect.y, 200.0);
    }

    #[test]
    fn tall_image_fits_to_height() {
        let img = image(50, 200); // ratio 0.25
        let rect = fit_rect(800.0, 600.0, &img, &Visuals::default(), 1.0);
        assert_eq!(rect.height, 600.0);
        assert_eq!(rect.width, 150.0);
        assert_eq!(rect.x, 325.0);
        assert_eq!(rect.y, 0.0);
    }

    #[test]
    fn scale_and_y_offset_apply_after_fit() {
        let img = image(100, 100);
        let visuals = Visuals {
            scale: 0.5,
            y_offset: 0.1,
            ..Visuals::default()
        };
        let rect = fit_rect(1000.0, 500.0, &img, &visuals, 1.0);
        assert_eq!(rect.width, 250.0);
        assert_eq!(rect.height, 250.0);
        assert_eq!(rect.x, 375.0);
        // Centered at 125, biased down by 0.1 * 500.
        assert_eq!(rect.y, 175.0);
    }

    #[test]
    fn viewport_policy_tiers() {
        let policy = ViewportPolicy::constrained_default();
        assert_eq!(policy.multiplier(0.45), 1.8); // portrait phone
        assert_eq!(policy.multiplier(0.7), 1.5); // squat tablet
        assert_eq!(ViewportPolicy::neutral().multiplier(0.45), 1.0);
    }

    #[test]
    fn resolve_prefers_exact_then_scans_backward_only() {
        let set = loaded_set(10, &[2, 5, 8]);
        assert_eq!(CanvasRenderer::resolve(&set, 5).unwrap().0, 5);
        assert_eq!(CanvasRenderer::resolve(&set, 7).unwrap().0, 5);
        assert_eq!(CanvasRenderer::resolve(&set, 1), None);
        assert_eq!(CanvasRenderer::resolve(&set, 9).unwrap().0, 8);
    }

    #[test]
    fn resolve_handles_failed_gap() {
        // Scenario: frame 7 failed, neighbors loaded; request 7 draws 6.
        let mut set = loaded_set(10, &[0, 1, 2, 3, 4, 5, 6, 8, 9]);
        set.set_failed(7);
        assert_eq!(CanvasRenderer::resolve(&set, 7).unwrap().0, 6);
    }

    #[test]
    fn resolve_empty_set_is_none() {
        let set = FrameSet::new(0);
        assert_eq!(CanvasRenderer::resolve(&set, 0), None);
        let set = FrameSet::new(5);
        assert_eq!(CanvasRenderer::resolve(&set, 4), None);
    }

    #[test]
    fn repeated_index_is_suppressed() {
        let set = loaded_set(10, &[0, 1, 2, 3]);
        let mut renderer = CanvasRenderer::new(ViewportPolicy::neutral());
        renderer.set_surface_size(800, 600);

        assert!(renderer.plan(&set, 2, &Visuals::default()).is_some());
        assert!(renderer.plan(&set, 2, &Visuals::default()).is_none());
        assert!(renderer.plan(&set, 3, &Visuals::default()).is_some());
    }

    #[test]
    fn resize_invalidates_cache_exactly_once() {
        let set = loaded_set(10, &[0, 1, 2, 3]);
        let mut renderer = CanvasRenderer::new(ViewportPolicy::neutral());
        renderer.set_surface_size(800, 600);
        assert!(renderer.plan(&set, 2, &Visuals::default()).is_some());

        // Same size: no invalidation, draw still suppressed.
        renderer.set_surface_size(800, 600);
        assert!(renderer.plan(&set, 2, &Visuals::default()).is_none());

        // New size: one forced redraw of the same index, then suppressed.
        renderer.set_surface_size(1600, 900);
        assert!(renderer.plan(&set, 2, &Visuals::default()).is_some());
        assert!(renderer.plan(&set, 2, &Visuals::default()).is_none());
    }

    #[test]
    fn zero_sized_surface_never_draws() {
        let set = loaded_set(10, &[0]);
        let mut renderer = CanvasRenderer::new(ViewportPolicy::neutral());
        assert!(renderer.plan(&set, 0, &Visuals::default()).is_none());
        renderer.set_surface_size(0, 600);
        assert!(renderer.plan(&set, 0, &Visuals::default()).is_none());
    }

    #[test]
    fn unresolvable_index_leaves_prior_frame() {
        let set = loaded_set(10, &[5]);
        let mut renderer = CanvasRenderer::new(ViewportPolicy::neutral());
        renderer.set_surface_size(800, 600);
        // Nothing at or below 3: no draw, prior content stays.
        assert!(renderer.plan(&set, 3, &Visuals::default()).is_none());
        assert!(renderer.plan(&set, 6, &Visuals::default()).is_some());
    }
}
