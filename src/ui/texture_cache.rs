//! Byte-capped LRU cache of uploaded frame textures.
//!
//! Decoded frames live as RGBA buffers in the FrameSet; the GPU texture for
//! a frame is created lazily on first draw and kept here. Sequences run to
//! hundreds of frames, so the cache is capped by payload bytes rather than
//! entry count, evicting least-recently-drawn frames first.

use std::num::NonZeroUsize;

use lru::LruCache;

const ENTRY_CAPACITY: usize = 1024;

#[derive(Clone)]
struct Entry<T> {
    value: T,
    bytes: usize,
}

pub struct TextureCache<T: Clone> {
    max_bytes: usize,
    bytes: usize,
    entries: LruCache<usize, Entry<T>>,
}

impl<T: Clone> TextureCache<T> {
    pub fn new(max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(ENTRY_CAPACITY).unwrap();
        Self {
            max_bytes,
            bytes: 0,
            entries: LruCache::new(capacity),
        }
    }

    pub fn get(&mut self, frame_index: usize) -> Option<T> {
        self.entries.get(&frame_index).map(|e| e.value.clone())
    }

    pub fn insert(&mut self, frame_index: usize, value: T, bytes: usize) {
        if let Some(existing) = self.entries.put(frame_index, Entry { value, bytes }) {
            self.bytes = self.bytes.saturating_sub(existing.bytes);
        }
        self.bytes = self.bytes.saturating_add(bytes);

        while self.bytes > self.max_bytes && self.entries.len() > 1 {
            if let Some((_index, evicted)) = self.entries.pop_lru() {
                self.bytes = self.bytes.saturating_sub(evicted.bytes);
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Drop every texture; called on product switch so the old sequence's
    /// GPU memory is reclaimable.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.bytes = 0;
    }
}
