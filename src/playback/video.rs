//! Readiness gate for the constrained-device video path.
//!
//! On narrow viewports the showcase scrubs a pre-encoded video instead of
//! driving the canvas loop. Browser-style media pipelines can stall or
//! error without ever signalling readiness, so the gate fails open: an
//! error counts as ready, and a deadline forces readiness if no signal
//! arrives at all. A broken video must never leave the product unreachable.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// How long to wait for the media pipeline before forcing readiness.
pub const FORCED_READY_AFTER: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadySource {
    /// The pipeline reported the stream prepared / data loaded.
    Media,
    /// The pipeline errored; treated as ready so browsing continues.
    Error,
    /// No signal before the deadline.
    Timeout,
}

#[derive(Debug)]
pub struct VideoGate {
    opened_at: Option<Instant>,
    ready: Option<ReadySource>,
}

impl VideoGate {
    pub fn new() -> Self {
        Self {
            opened_at: None,
            ready: None,
        }
    }

    /// Begin waiting on a freshly opened video. Resets any prior readiness.
    pub fn open(&mut self, now: Instant) {
        self.opened_at = Some(now);
        self.ready = None;
    }

    pub fn on_prepared(&mut self) {
        if self.ready.is_none() {
            debug!("Video pipeline prepared");
            self.ready = Some(ReadySource::Media);
        }
    }

    pub fn on_error(&mut self) {
        if self.ready.is_none() {
            warn!("Video pipeline errored, forcing ready");
            self.ready = Some(ReadySource::Error);
        }
    }

    /// Check the forced-ready deadline. Call from the tick loop.
    pub fn poll(&mut self, now: Instant) {
        if self.ready.is_none() {
            if let Some(opened) = self.opened_at {
                if now.duration_since(opened) >= FORCED_READY_AFTER {
                    warn!("Video pipeline stalled, forcing ready after deadline");
                    self.ready = Some(ReadySource::Timeout);
                }
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_some()
    }

    pub fn ready_source(&self) -> Option<ReadySource> {
        self.ready
    }
}

impl Default for VideoGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Play-head position for a scrubbed video: smoothed progress mapped onto
/// the stream duration.
pub fn seek_position(smoothed_progress: f64, duration: Duration) -> Duration {
    let progress = smoothed_progress.clamp(0.0, 1.0);
    duration.mul_f64(progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepared_signal_makes_ready() {
        let mut gate = VideoGate::new();
        let now = Instant::now();
        gate.open(now);
        assert!(!gate.is_ready());
        gate.on_prepared();
        assert_eq!(gate.ready_source(), Some(ReadySource::Media));
    }

    #[test]
    fn error_fails_open() {
        let mut gate = VideoGate::new();
        gate.open(Instant::now());
        gate.on_error();
        assert_eq!(gate.ready_source(), Some(ReadySource::Error));
    }

    #[test]
    fn deadline_forces_ready() {
        let mut gate = VideoGate::new();
        let start = Instant::now();
        gate.open(start);
        gate.poll(start + Duration::from_millis(2000));
        assert!(!gate.is_ready());
        gate.poll(start + FORCED_READY_AFTER);
        assert_eq!(gate.ready_source(), Some(ReadySource::Timeout));
    }

    #[test]
    fn first_signal_wins() {
        let mut gate = VideoGate::new();
        let start = Instant::now();
        gate.open(start);
        gate.on_prepared();
        gate.on_error();
        gate.poll(start + Duration::from_secs(10));
        assert_eq!(gate.ready_source(), Some(ReadySource::Media));
    }

    #[test]
    fn reopen_resets_readiness() {
        let mut gate = VideoGate::new();
        gate.open(Instant::now());
        gate.on_prepared();
        gate.open(Instant::now());
        assert!(!gate.is_ready());
    }

    #[test]
    fn seek_position_maps_progress_onto_duration() {
        let duration = Duration::from_secs(10);
        assert_eq!(seek_position(0.0, duration), Duration::ZERO);
        assert_eq!(seek_position(0.5, duration), Duration::from_secs(5));
        assert_eq!(seek_position(1.0, duration), duration);
        // Spring overshoot clamps.
        assert_eq!(seek_position(1.2, duration), duration);
        assert_eq!(seek_position(-0.2, duration), Duration::ZERO);
    }
}
