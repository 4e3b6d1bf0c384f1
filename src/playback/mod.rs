//! Sequence playback orchestration.
//!
//! - `SequencePlaybackController` - render loop state machine
//! - `VideoGate` - readiness gate for the constrained-device video path

pub mod controller;
pub mod video;

pub use controller::{Phase, SequencePlaybackController};
pub use video::{seek_position, ReadySource, VideoGate, FORCED_READY_AFTER};
