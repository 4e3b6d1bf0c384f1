//! Progress to frame index mapping.

/// Map a progress value to a frame index.
///
/// Total for every input: out-of-range progress (spring overshoot) is
/// clamped, and `frame_count == 0` yields 0 rather than panicking.
pub fn map_to_frame(progress: f64, frame_count: usize) -> usize {
    if frame_count <= 1 {
        return 0;
    }
    let max_frame = frame_count - 1;
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    ((progress * max_frame as f64).floor() as usize).min(max_frame)
}
