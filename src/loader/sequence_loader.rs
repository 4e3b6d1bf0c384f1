//! Two-phase sequence loader.
//!
//! Phase 1 fetches the critical head of the sequence in parallel and drives
//! the user-visible progress percentage. Phase 2 trickles in the remaining
//! frames in small batches with a cooperative yield between batches so a
//! background load never starves the render loop or the critical fetches of
//! a subsequent product switch.
//!
//! Every frame write checks the cancellation token under the storage lock;
//! once a session's token is cancelled nothing originating from it touches
//! the FrameSet or LoadState again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::loader::fetcher::{FetchError, FrameFetcher};
use crate::models::{FrameImage, FrameSet, LoadState};

/// Background-phase batch width.
const BATCH_SIZE: usize = 5;

/// Cooperative yield between background batches.
const BATCH_YIELD_MS: u64 = 10;

/// Default critical head size.
pub const CRITICAL_COUNT: usize = 25;

/// Cancellation token threaded through every async step of one session.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Everything needed to start one load session.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    pub base_path: String,
    pub frame_count: usize,
    pub extension: String,
    /// Frames that must settle before playback is considered ready.
    /// Clamped to `1..=frame_count`.
    pub critical_count: usize,
}

impl LoadPlan {
    pub fn new(base_path: &str, frame_count: usize, extension: &str, critical_count: usize) -> Self {
        Self {
            base_path: base_path.to_string(),
            frame_count,
            extension: extension.to_string(),
            critical_count: critical_count.clamp(1, frame_count.max(1)),
        }
    }
}

struct Shared {
    frames: RwLock<FrameSet>,
    state: RwLock<LoadState>,
}

/// Handle to one in-flight (or finished) load session.
///
/// Owns the session's FrameSet. Dropping the session cancels it, so a load
/// can never keep writing into storage nobody observes anymore.
pub struct LoadSession {
    shared: Arc<Shared>,
    updates: flume::Receiver<LoadState>,
    cancel: CancelToken,
    task: tokio::task::JoinHandle<()>,
}

impl LoadSession {
    /// Current aggregate state, readable at any time.
    pub fn state(&self) -> LoadState {
        *self.shared.state.read()
    }

    /// Drain all state snapshots published since the last poll.
    pub fn poll_updates(&self) -> Vec<LoadState> {
        let mut out = Vec::new();
        while let Ok(state) = self.updates.try_recv() {
            out.push(state);
        }
        out
    }

    /// Read access to the frame storage for rendering.
    pub fn frames(&self) -> RwLockReadGuard<'_, FrameSet> {
        self.shared.frames.read()
    }

    pub fn loaded_count(&self) -> usize {
        self.shared.frames.read().loaded_count()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel in-flight fetches and release all frame handles.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.task.abort();
        self.shared.frames.write().clear();
    }
}

impl Drop for LoadSession {
    fn drop(&mut self) {
        if !self.cancel.is_cancelled() {
            self.cancel();
        }
    }
}

/// Factory for load sessions. One loader is shared per component instance;
/// the playback controller enforces at most one live session at a time.
pub struct SequenceLoader {
    runtime: Handle,
    fetcher: Arc<dyn FrameFetcher>,
}

impl SequenceLoader {
    pub fn new(runtime: Handle, fetcher: Arc<dyn FrameFetcher>) -> Self {
        Self { runtime, fetcher }
    }

    /// Start loading a sequence. The caller must cancel any prior session
    /// first (see `SequencePlaybackController::switch_product`).
    pub fn start(&self, plan: LoadPlan) -> LoadSession {
        let shared = Arc::new(Shared {
            frames: RwLock::new(FrameSet::new(plan.frame_count)),
            state: RwLock::new(LoadState::default()),
        });
        let (tx, rx) = flume::unbounded();
        let cancel = CancelToken::new();

        debug!(
            base = %plan.base_path,
            frames = plan.frame_count,
            critical = plan.critical_count,
            "Starting sequence load"
        );

        let task = self.runtime.spawn(run_load(
            plan,
            Arc::clone(&self.fetcher),
            Arc::clone(&shared),
            tx,
            cancel.clone(),
        ));

        LoadSession {
            shared,
            updates: rx,
            cancel,
            task,
        }
    }
}

type FetchOutcome = (usize, Result<FrameImage, FetchError>);

fn spawn_fetch(
    join: &mut JoinSet<FetchOutcome>,
    fetcher: &Arc<dyn FrameFetcher>,
    plan: &LoadPlan,
    index: usize,
) {
    let fetcher = Arc::clone(fetcher);
    let base = plan.base_path.clone();
    let ext = plan.extension.clone();
    join.spawn(async move {
        let result = tokio::task::spawn_blocking(move || fetcher.fetch(&base, index, &ext)).await;
        match result {
            Ok(outcome) => (index, outcome),
            Err(join_err) => (index, Err(FetchError::Decode(join_err.into()))),
        }
    });
}

/// Apply one settled fetch to the session. Returns false when the session
/// was cancelled and the result was discarded.
fn apply_outcome(shared: &Shared, cancel: &CancelToken, outcome: FetchOutcome) -> bool {
    let (index, result) = outcome;
    // The token check happens under the frames lock: `cancel()` sets the
    // token before clearing slots under this same lock, so a settle racing
    // the cancel can never repopulate a cleared slot.
    match result {
        Ok(image) => {
            let mut frames = shared.frames.write();
            if cancel.is_cancelled() {
                return false;
            }
            frames.set_loaded(index, image);
            drop(frames);
            if index == 0 {
                shared.state.write().first_frame_loaded = true;
            }
        }
        Err(err) => {
            let mut frames = shared.frames.write();
            if cancel.is_cancelled() {
                return false;
            }
            warn!(index, error = %err, "Failed to load frame");
            frames.set_failed(index);
        }
    }
    true
}

fn publish(shared: &Shared, tx: &flume::Sender<LoadState>, mutate: impl FnOnce(&mut LoadState)) {
    let snapshot = {
        let mut state = shared.state.write();
        mutate(&mut state);
        *state
    };
    let _ = tx.send(snapshot);
}

async fn run_load(
    plan: LoadPlan,
    fetcher: Arc<dyn FrameFetcher>,
    shared: Arc<Shared>,
    tx: flume::Sender<LoadState>,
    cancel: CancelToken,
) {
    let critical = plan.critical_count.min(plan.frame_count);

    // Phase 1: critical head, all fetches in flight at once. Settlement
    // order is whatever the decode threads produce.
    let mut join = JoinSet::new();
    for index in 0..critical {
        spawn_fetch(&mut join, &fetcher, &plan, index);
    }

    let mut settled = 0usize;
    while let Some(result) = join.join_next().await {
        match result {
            Ok(outcome) => {
                if !apply_outcome(&shared, &cancel, outcome) {
                    return;
                }
            }
            // A panicked decode task still counts as settled; the slot
            // stays Empty and the renderer falls back past it.
            Err(join_err) => {
                warn!(error = %join_err, "Frame fetch task failed");
                if cancel.is_cancelled() {
                    return;
                }
            }
        }
        settled += 1;
        let percent = ((settled * 100) as f64 / critical as f64).round() as u8;
        publish(&shared, &tx, |state| {
            state.progress_percent = percent;
            if settled == critical {
                state.critical_loaded = true;
            }
        });
    }

    if cancel.is_cancelled() {
        return;
    }
    debug!(critical, "Critical phase settled");

    // Phase 2: remaining frames, batched and strictly ordered between
    // batches. The inter-batch sleep is the loader's only backpressure.
    let mut next = critical;
    while next < plan.frame_count {
        if cancel.is_cancelled() {
            return;
        }
        let end = (next + BATCH_SIZE).min(plan.frame_count);
        let mut batch = JoinSet::new();
        for index in next..end {
            spawn_fetch(&mut batch, &fetcher, &plan, index);
        }
        while let Some(result) = batch.join_next().await {
            if let Ok(outcome) = result {
                if !apply_outcome(&shared, &cancel, outcome) {
                    return;
                }
            }
        }
        next = end;
        tokio::time::sleep(std::time::Duration::from_millis(BATCH_YIELD_MS)).await;
    }

    if cancel.is_cancelled() {
        return;
    }
    publish(&shared, &tx, |state| state.full_loaded = true);
    debug!(frames = plan.frame_count, "Sequence fully loaded");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use crate::models::FrameSlot;

    /// Scripted fetcher: per-index delays and failures, plus a call counter.
    struct MockFetcher {
        delay: Duration,
        per_index_delay: HashMap<usize, Duration>,
        failures: HashSet<usize>,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                per_index_delay: HashMap::new(),
                failures: HashSet::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(delay: Duration, failures: &[usize]) -> Self {
            let mut fetcher = Self::new(delay);
            fetcher.failures = failures.iter().copied().collect();
            fetcher
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FrameFetcher for MockFetcher {
        fn fetch(&self, _base: &str, index: usize, _ext: &str) -> Result<FrameImage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.per_index_delay.get(&index).copied().unwrap_or(self.delay);
            std::thread::sleep(delay);
            if self.failures.contains(&index) {
                return Err(FetchError::Missing(format!("{}.webp", index).into()));
            }
            Ok(FrameImage::new(4, 4, vec![0u8; 64]))
        }
    }

    async fn wait_until(session: &LoadSession, pred: impl Fn(LoadState) -> bool) {
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while !pred(session.state()) {
            assert!(
                std::time::Instant::now() < deadline,
                "timed out waiting for state, last = {:?}",
                session.state()
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn loader(fetcher: Arc<dyn FrameFetcher>) -> SequenceLoader {
        SequenceLoader::new(Handle::current(), fetcher)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn full_success_reaches_every_milestone() {
        let loader = loader(Arc::new(MockFetcher::new(Duration::from_millis(1))));
        let session = loader.start(LoadPlan::new("assets/a", 120, "webp", 25));

        wait_until(&session, |s| s.first_frame_loaded).await;
        wait_until(&session, |s| s.critical_loaded).await;
        assert_eq!(session.state().progress_percent, 100);
        wait_until(&session, |s| s.full_loaded).await;
        assert_eq!(session.loaded_count(), 120);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn progress_is_monotonic_and_ends_at_100() {
        let loader = loader(Arc::new(MockFetcher::new(Duration::from_millis(2))));
        let session = loader.start(LoadPlan::new("assets/a", 40, "webp", 20));

        wait_until(&session, |s| s.full_loaded).await;

        let updates = session.poll_updates();
        assert!(!updates.is_empty());
        let mut last = 0u8;
        for state in &updates {
            assert!(state.progress_percent >= last, "progress went backwards");
            last = state.progress_percent;
        }
        let critical_point = updates.iter().find(|s| s.critical_loaded).unwrap();
        assert_eq!(critical_point.progress_percent, 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failed_frame_is_marked_and_does_not_block() {
        let fetcher = Arc::new(MockFetcher::failing(Duration::from_millis(1), &[7]));
        let loader = loader(fetcher);
        let session = loader.start(LoadPlan::new("assets/a", 30, "webp", 10));

        wait_until(&session, |s| s.full_loaded).await;
        assert_eq!(session.loaded_count(), 29);
        assert!(matches!(session.frames().get(7), Some(FrameSlot::Failed)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn all_critical_failures_still_settle_fail_open() {
        let failures: Vec<usize> = (0..10).collect();
        let fetcher = Arc::new(MockFetcher::failing(Duration::from_millis(1), &failures));
        let loader = loader(fetcher);
        let session = loader.start(LoadPlan::new("assets/a", 10, "webp", 10));

        wait_until(&session, |s| s.critical_loaded).await;
        let state = session.state();
        assert!(!state.first_frame_loaded);
        assert_eq!(state.progress_percent, 100);
        assert_eq!(session.loaded_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancelled_session_never_sees_late_writes() {
        let slow = Arc::new(MockFetcher::new(Duration::from_millis(25)));
        let fast = Arc::new(MockFetcher::new(Duration::from_millis(1)));

        let loader_a = loader(slow);
        let session_a = loader_a.start(LoadPlan::new("assets/a", 120, "webp", 25));

        // Let A reach partial critical progress, then switch products.
        wait_until(&session_a, |s| s.progress_percent >= 30).await;
        session_a.cancel();

        let loader_b = loader(Arc::clone(&fast) as Arc<dyn FrameFetcher>);
        let session_b = loader_b.start(LoadPlan::new("assets/b", 200, "webp", 25));

        // B starts fresh and completes independently.
        assert_eq!(session_b.state(), LoadState::default());
        wait_until(&session_b, |s| s.full_loaded).await;
        assert_eq!(session_b.loaded_count(), 200);
        assert_eq!(session_b.frames().len(), 200);

        // Give any in-flight A fetches ample time to resolve late, then
        // verify nothing mutated A's storage after cancellation.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let frozen = session_a.loaded_count();
        let frozen_state = session_a.state();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(session_a.loaded_count(), frozen);
        assert_eq!(session_a.state(), frozen_state);
        assert!(!session_a.state().full_loaded);

        // Cancellation cleared the slots for reclamation.
        assert_eq!(frozen, 0);
        assert!(fast.calls() >= 200);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancel_racing_a_settling_fetch_leaves_no_frames() {
        // Repeatedly cancel while fetches are mid-settlement; the cleared
        // FrameSet must never be repopulated by a straggler.
        let fetcher = Arc::new(MockFetcher::new(Duration::from_millis(2)));
        for _ in 0..50 {
            let loader = loader(Arc::clone(&fetcher) as Arc<dyn FrameFetcher>);
            let session = loader.start(LoadPlan::new("assets/a", 8, "webp", 8));
            tokio::time::sleep(Duration::from_millis(2)).await;
            session.cancel();
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert_eq!(session.loaded_count(), 0, "slot written after cancel");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn dropping_a_session_cancels_it() {
        let fetcher = Arc::new(MockFetcher::new(Duration::from_millis(20)));
        let loader = loader(Arc::clone(&fetcher) as Arc<dyn FrameFetcher>);
        let session = loader.start(LoadPlan::new("assets/a", 500, "webp", 25));
        wait_until(&session, |s| s.progress_percent > 0).await;
        drop(session);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let settled = fetcher.calls();
        tokio::time::sleep(Duration::from_millis(200)).await;
        // No new fetches are issued once the session is gone; at most the
        // already-dispatched blocking decodes drain.
        assert!(fetcher.calls() <= settled + BATCH_SIZE);
    }

    #[test]
    fn plan_clamps_critical_count() {
        let plan = LoadPlan::new("assets/a", 10, "webp", 50);
        assert_eq!(plan.critical_count, 10);
        let plan = LoadPlan::new("assets/a", 10, "webp", 0);
        assert_eq!(plan.critical_count, 1);
    }
}
