//! Frame storage shared between the sequence loader and the renderer.
//!
//! A `FrameSet` is a fixed-length slot array owned by exactly one load
//! session. The loader is the only writer; the renderer only reads. The
//! cancellation discipline in the loader is what keeps two sessions from
//! ever mutating the same set.

use std::sync::Arc;

/// One decoded frame. Pixel data is RGBA8, tightly packed.
#[derive(Clone, PartialEq)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
}

impl FrameImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width as usize) * (height as usize) * 4);
        Self {
            width,
            height,
            data: data.into(),
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

impl std::fmt::Debug for FrameImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// State of one slot in the sequence.
#[derive(Debug, Clone, Default)]
pub enum FrameSlot {
    /// Not fetched yet (or fetch still in flight).
    #[default]
    Empty,
    Loaded(FrameImage),
    /// Fetch or decode failed; compensated at render time by the
    /// nearest-available fallback. Never retried.
    Failed,
}

impl FrameSlot {
    pub fn is_loaded(&self) -> bool {
        matches!(self, FrameSlot::Loaded(_))
    }
}

/// Fixed-length, ordered frame storage for one load session.
#[derive(Debug)]
pub struct FrameSet {
    slots: Vec<FrameSlot>,
}

impl FrameSet {
    pub fn new(frame_count: usize) -> Self {
        let mut slots = Vec::with_capacity(frame_count);
        slots.resize_with(frame_count, FrameSlot::default);
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FrameSlot> {
        self.slots.get(index)
    }

    pub fn image(&self, index: usize) -> Option<&FrameImage> {
        match self.slots.get(index) {
            Some(FrameSlot::Loaded(img)) => Some(img),
            _ => None,
        }
    }

    pub fn set_loaded(&mut self, index: usize, image: FrameImage) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = FrameSlot::Loaded(image);
        }
    }

    pub fn set_failed(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = FrameSlot::Failed;
        }
    }

    pub fn loaded_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_loaded()).count()
    }

    /// Release all image handles so memory can be reclaimed on teardown.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = FrameSlot::Empty;
        }
    }
}

/// Aggregate readiness of one load session. Within a session every field
/// only moves forward; a product switch replaces the whole struct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadState {
    /// All critical fetches have settled (success or failure).
    pub critical_loaded: bool,
    /// Every frame in the sequence has settled.
    pub full_loaded: bool,
    /// Frame 0 decoded successfully; something can be painted.
    pub first_frame_loaded: bool,
    /// Critical-phase progress, 0..=100.
    pub progress_percent: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn test_image(width: u32, height: u32) -> FrameImage {
        FrameImage::new(width, height, vec![0u8; (width * height * 4) as usize])
    }

    #[test]
    fn slots_start_empty() {
        let set = FrameSet::new(4);
        assert_eq!(set.len(), 4);
        assert_eq!(set.loaded_count(), 0);
        assert!(set.image(0).is_none());
    }

    #[test]
    fn set_and_clear_round_trip() {
        let mut set = FrameSet::new(3);
        set.set_loaded(1, test_image(8, 8));
        set.set_failed(2);
        assert_eq!(set.loaded_count(), 1);
        assert!(set.image(1).is_some());
        assert!(matches!(set.get(2), Some(FrameSlot::Failed)));

        set.clear();
        assert_eq!(set.loaded_count(), 0);
        assert!(matches!(set.get(2), Some(FrameSlot::Empty)));
    }

    #[test]
    fn out_of_range_writes_are_ignored() {
        let mut set = FrameSet::new(2);
        set.set_loaded(5, test_image(8, 8));
        set.set_failed(9);
        assert_eq!(set.loaded_count(), 0);
    }
}
