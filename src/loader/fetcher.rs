//! Frame fetching and decoding.
//!
//! A `FrameFetcher` resolves one frame of a sequence into decoded RGBA
//! pixels. The production implementation reads `{base}/{index}.{ext}` from
//! disk; tests substitute a controllable mock with scripted delays and
//! failures.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use thiserror::Error;

use crate::models::FrameImage;

/// Cap on the longest decoded edge. Sequences run into hundreds of frames,
/// so full-resolution decodes would blow memory on large source assets.
pub const MAX_DECODE_EDGE: u32 = 2048;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("frame asset missing: {0}")]
    Missing(PathBuf),
    #[error("frame decode failed: {0}")]
    Decode(#[from] anyhow::Error),
}

/// Blocking fetch of a single frame. Called from worker threads
/// (`spawn_blocking`); implementations must be `Send + Sync`.
pub trait FrameFetcher: Send + Sync {
    fn fetch(&self, base_path: &str, index: usize, extension: &str) -> Result<FrameImage, FetchError>;
}

/// Filesystem fetcher decoding via the `image` crate, downscaling anything
/// larger than `max_edge` on its longest side.
pub struct FsFetcher {
    max_edge: u32,
}

impl FsFetcher {
    pub fn new() -> Self {
        Self {
            max_edge: MAX_DECODE_EDGE,
        }
    }

    pub fn with_max_edge(max_edge: u32) -> Self {
        Self {
            max_edge: max_edge.max(1),
        }
    }

    fn decode(&self, path: &Path) -> anyhow::Result<FrameImage> {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read frame: {:?}", path))?;
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .context("Failed to guess frame format")?;
        let decoded = reader
            .decode()
            .with_context(|| format!("Failed to decode frame: {:?}", path))?;

        let decoded = if decoded.width().max(decoded.height()) > self.max_edge {
            decoded.resize(self.max_edge, self.max_edge, FilterType::Triangle)
        } else {
            decoded
        };

        Ok(to_frame_image(decoded))
    }
}

impl Default for FsFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameFetcher for FsFetcher {
    fn fetch(&self, base_path: &str, index: usize, extension: &str) -> Result<FrameImage, FetchError> {
        let path = PathBuf::from(base_path).join(format!("{}.{}", index, extension));
        if !path.is_file() {
            return Err(FetchError::Missing(path));
        }
        self.decode(&path).map_err(FetchError::Decode)
    }
}

fn to_frame_image(decoded: DynamicImage) -> FrameImage {
    let rgba = decoded.into_rgba8();
    let (width, height) = rgba.dimensions();
    FrameImage::new(width, height, rgba.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn fetches_existing_frame() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "0.png", 16, 9);

        let fetcher = FsFetcher::new();
        let frame = fetcher.fetch(dir.path().to_str().unwrap(), 0, "png").unwrap();
        assert_eq!((frame.width, frame.height), (16, 9));
        assert_eq!(frame.data.len(), 16 * 9 * 4);
    }

    #[test]
    fn missing_frame_is_reported_not_panicked() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FsFetcher::new();
        let err = fetcher
            .fetch(dir.path().to_str().unwrap(), 7, "png")
            .unwrap_err();
        assert!(matches!(err, FetchError::Missing(_)));
    }

    #[test]
    fn oversized_frames_are_downscaled() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "0.png", 64, 32);

        let fetcher = FsFetcher::with_max_edge(32);
        let frame = fetcher.fetch(dir.path().to_str().unwrap(), 0, "png").unwrap();
        assert!(frame.width <= 32 && frame.height <= 32);
        // Aspect ratio preserved by the resize.
        assert_eq!((frame.width, frame.height), (32, 16));
    }
}
