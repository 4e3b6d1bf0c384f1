//! Playback orchestration.
//!
//! The controller owns one load session, the scroll spring, and the draw
//! planner, and advances them from the host's animation-frame tick. It is
//! the only place that starts or cancels load sessions, which is what
//! enforces the at-most-one-live-session rule the cancellation model
//! depends on.

use std::time::Instant;

use tracing::{debug, info};

use crate::loader::{LoadPlan, LoadSession, SequenceLoader, CRITICAL_COUNT};
use crate::models::{LoadState, Product, Visuals};
use crate::playback::video::VideoGate;
use crate::render::{map_to_frame, surface_size, CanvasRenderer, DrawOp, ViewportPolicy};
use crate::scroll::ScrollProgressSource;

/// Playback lifecycle. `Switching` from the design is not a stored state:
/// `switch_product` performs the whole reset synchronously and lands back
/// in `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No product mounted.
    Idle,
    /// Critical head still loading; UI shows the progress indicator.
    Loading,
    /// Playable; background frames still trickling in.
    Ready,
    FullyLoaded,
}

pub struct SequencePlaybackController {
    loader: SequenceLoader,
    session: Option<LoadSession>,
    product: Option<Product>,
    phase: Phase,
    state: LoadState,
    scroll: ScrollProgressSource,
    renderer: CanvasRenderer,
    video: VideoGate,
    constrained: bool,
    /// Frame 0 has been force-rendered for the current session.
    first_frame_painted: bool,
}

impl SequencePlaybackController {
    pub fn new(loader: SequenceLoader, viewport_height: f64) -> Self {
        Self {
            loader,
            session: None,
            product: None,
            phase: Phase::Idle,
            state: LoadState::default(),
            scroll: ScrollProgressSource::new(viewport_height),
            renderer: CanvasRenderer::new(ViewportPolicy::neutral()),
            video: VideoGate::new(),
            constrained: false,
            first_frame_painted: false,
        }
    }

    /// Select the device profile. Constrained viewports get the tiered
    /// zoom policy and play the pre-encoded video instead of the sequence.
    pub fn set_constrained(&mut self, constrained: bool) {
        if self.constrained == constrained {
            return;
        }
        self.constrained = constrained;
        self.renderer.set_policy(if constrained {
            ViewportPolicy::constrained_default()
        } else {
            ViewportPolicy::neutral()
        });
    }

    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    /// Mount a product: cancel the previous session, reset every piece of
    /// per-session state, and start loading from scratch.
    pub fn switch_product(&mut self, product: Product, now: Instant) {
        if let Some(old) = self.session.take() {
            debug!(product = %product.id, "Cancelling previous load session");
            old.cancel();
        }

        info!(product = %product.id, frames = product.frame_count, "Switching product");

        self.state = LoadState::default();
        self.first_frame_painted = false;
        self.scroll.reset();
        self.renderer.invalidate();

        // The video owns playback on constrained viewports; decoding the
        // frame sequence there would spend memory on frames that never
        // display.
        self.session = if self.constrained {
            self.video.open(now);
            None
        } else {
            let plan = LoadPlan::new(
                product.folder,
                product.frame_count,
                product.file_extension,
                CRITICAL_COUNT,
            );
            Some(self.loader.start(plan))
        };
        self.product = Some(product);
        self.phase = Phase::Loading;
    }

    /// Unmount: cancel loading and release all frame handles.
    pub fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel();
        }
        self.product = None;
        self.phase = Phase::Idle;
        self.state = LoadState::default();
        self.first_frame_painted = false;
        self.scroll.reset();
        self.renderer.invalidate();
    }

    /// Viewport resized. Recomputes the surface resolution (invalidating
    /// the draw cache once) and immediately re-plans the current frame so
    /// the display never holds a stale-resolution frame until the next
    /// scroll event.
    pub fn resize(&mut self, logical_width: f64, logical_height: f64, dpr: f64) -> Option<DrawOp> {
        let (w, h) = surface_size(logical_width, logical_height, dpr);
        self.renderer.set_surface_size(w, h);
        self.scroll.set_viewport_height(logical_height);
        self.plan_current()
    }

    pub fn scroll_by(&mut self, delta: f64) {
        self.scroll.scroll_by(delta);
    }

    pub fn set_scroll_offset(&mut self, offset: f64) {
        self.scroll.set_offset(offset);
    }

    /// One animation-frame tick: drain loader updates, advance the spring,
    /// and plan at most one draw.
    pub fn tick(&mut self, now: Instant, dt: f64) -> Option<DrawOp> {
        self.drain_session_updates();
        if self.constrained {
            self.video.poll(now);
            if self.phase == Phase::Loading && self.video.is_ready() {
                self.phase = Phase::Ready;
            }
        }

        self.scroll.tick(dt);

        if self.phase == Phase::Idle {
            return None;
        }

        // Paint frame 0 as soon as it exists, even before the critical
        // batch settles, so the canvas is never blank behind the loader.
        if self.state.first_frame_loaded && !self.first_frame_painted {
            self.first_frame_painted = true;
            self.renderer.invalidate();
            return self.plan_index(0);
        }

        if !self.state.critical_loaded {
            return None;
        }

        self.plan_current()
    }

    fn drain_session_updates(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let mut critical_just_loaded = false;
        for update in session.poll_updates() {
            if update.critical_loaded && !self.state.critical_loaded {
                critical_just_loaded = true;
            }
            self.state = update;
        }
        if critical_just_loaded {
            debug!("Critical frames settled, playback ready");
            // Redraw even if the index has not changed: the exact frame may
            // have been a fallback while loading.
            self.renderer.invalidate();
        }
        if self.state.full_loaded {
            self.phase = Phase::FullyLoaded;
        } else if self.state.critical_loaded {
            self.phase = Phase::Ready;
        }
    }

    fn plan_current(&mut self) -> Option<DrawOp> {
        let frame_count = self.product.as_ref()?.frame_count;
        let index = map_to_frame(self.scroll.smoothed(), frame_count);
        self.plan_index(index)
    }

    fn plan_index(&mut self, index: usize) -> Option<DrawOp> {
        let session = self.session.as_ref()?;
        let visuals = self
            .product
            .as_ref()
            .map(|p| p.visuals)
            .unwrap_or_default();
        Self::plan_with(&mut self.renderer, session, index, &visuals)
    }

    fn plan_with(
        renderer: &mut CanvasRenderer,
        session: &LoadSession,
        index: usize,
        visuals: &Visuals,
    ) -> Option<DrawOp> {
        let frames = session.frames();
        renderer.plan(&frames, index, visuals)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn load_state(&self) -> LoadState {
        self.state
    }

    /// Progress for the loading indicator. The video path reports 100 once
    /// playable since the sequence percentage is meaningless there.
    pub fn progress_percent(&self) -> u8 {
        if self.constrained && self.is_ready() {
            100
        } else {
            self.state.progress_percent
        }
    }

    pub fn is_ready(&self) -> bool {
        if self.constrained {
            self.video.is_ready()
        } else {
            self.state.critical_loaded
        }
    }

    /// True when the critical head settled without a single loaded frame.
    /// Loading still fails open; the UI uses this to show an explicit
    /// "signal lost" card instead of a silent blank canvas.
    pub fn sequence_unavailable(&self) -> bool {
        self.state.critical_loaded
            && self
                .session
                .as_ref()
                .map(|s| s.loaded_count() == 0)
                .unwrap_or(false)
    }

    pub fn active_product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    pub fn raw_progress(&self) -> f64 {
        self.scroll.raw()
    }

    pub fn smoothed_progress(&self) -> f64 {
        self.scroll.smoothed()
    }

    pub fn session(&self) -> Option<&LoadSession> {
        self.session.as_ref()
    }

    pub fn video_gate_mut(&mut self) -> &mut VideoGate {
        &mut self.video
    }
}

impl Drop for SequencePlaybackController {
    fn drop(&mut self) {
        self.teardown();
    }
}
