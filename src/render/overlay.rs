//! Scroll-keyed text overlay bands.
//!
//! Each storytelling section fades in and out over a fixed band of the
//! scroll progress. The bands are piecewise-linear keyframe tracks; the UI
//! applies the sampled opacity/offset/scale to its labels every tick.

/// Sample a piecewise-linear track at `t`. Outside the keyframe range the
/// track holds its end values.
pub fn sample_track(t: f64, keys: &[(f64, f64)]) -> f64 {
    match keys {
        [] => 0.0,
        [only] => only.1,
        _ => {
            if t <= keys[0].0 {
                return keys[0].1;
            }
            for pair in keys.windows(2) {
                let (t0, v0) = pair[0];
                let (t1, v1) = pair[1];
                if t <= t1 {
                    if t1 <= t0 {
                        return v1;
                    }
                    let f = (t - t0) / (t1 - t0);
                    return v0 + (v1 - v0) * f;
                }
            }
            keys[keys.len() - 1].1
        }
    }
}

/// Sampled state of one overlay section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayState {
    pub opacity: f64,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for OverlayState {
    fn default() -> Self {
        Self {
            opacity: 0.0,
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

/// Number of overlay sections (intro, feature, detail, outro/CTA).
pub const SECTION_COUNT: usize = 4;

/// Sample all overlay sections at a raw scroll progress.
pub fn sample_sections(progress: f64) -> [OverlayState; SECTION_COUNT] {
    let t = progress.clamp(0.0, 1.0);
    [
        // Intro: hero name, fades out over the first fifth.
        OverlayState {
            opacity: sample_track(t, &[(0.0, 1.0), (0.1, 1.0), (0.2, 0.0)]),
            x: 0.0,
            y: sample_track(t, &[(0.0, 0.0), (0.2, -50.0)]),
            scale: sample_track(t, &[(0.0, 1.0), (0.2, 0.8)]),
        },
        // Feature callout during the exploded view.
        OverlayState {
            opacity: sample_track(t, &[(0.25, 0.0), (0.35, 1.0), (0.45, 1.0), (0.55, 0.0)]),
            x: sample_track(t, &[(0.25, -50.0), (0.55, 0.0)]),
            y: 0.0,
            scale: 1.0,
        },
        // Detail pass.
        OverlayState {
            opacity: sample_track(t, &[(0.6, 0.0), (0.7, 1.0), (0.8, 0.0)]),
            x: 0.0,
            y: sample_track(t, &[(0.6, 50.0), (0.8, 0.0)]),
            scale: 1.0,
        },
        // Reassembly + call to action, holds through the end.
        OverlayState {
            opacity: sample_track(t, &[(0.85, 0.0), (0.95, 1.0)]),
            x: 0.0,
            y: 0.0,
            scale: sample_track(t, &[(0.85, 0.9), (1.0, 1.0)]),
        },
    ]
}
