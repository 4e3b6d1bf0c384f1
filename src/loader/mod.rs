//! Progressive, cancellable loading of frame sequences.
//!
//! - `FrameFetcher` / `FsFetcher` - per-frame fetch + decode
//! - `SequenceLoader` - two-phase (critical, then background) load sessions
//! - `CancelToken` - cooperative cancellation threaded through every step

pub mod fetcher;
pub mod sequence_loader;

pub use fetcher::{FetchError, FrameFetcher, FsFetcher};
pub use sequence_loader::{
    CancelToken, LoadPlan, LoadSession, SequenceLoader, CRITICAL_COUNT,
};
