//! Snapshot capture from the live video source

use anyhow::{Context, Result};
use greenproof_common::{CaptureError, Snapshot};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// MIME type of every snapshot the capturer produces
pub const SNAPSHOT_MIME_TYPE: &str = "image/jpeg";

/// JPEG quality used when encoding frames
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// A live video source that can be sampled at any instant
pub trait FrameSource: Send + Sync {
    /// The frame currently displayed, or `None` if the source is not
    /// started or the device has been revoked
    fn current_frame(&self) -> Option<RgbImage>;
}

/// Grabs one still image from a frame source on demand
#[derive(Clone)]
pub struct SnapshotCapturer {
    source: Arc<dyn FrameSource>,
    quality: u8,
}

impl SnapshotCapturer {
    pub fn new(source: Arc<dyn FrameSource>) -> Self {
        Self {
            source,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Encode the source's current frame as a JPEG snapshot
    pub fn capture(&self) -> Result<Snapshot, CaptureError> {
        let frame = self.source.current_frame().ok_or(CaptureError::NoFrame)?;
        if frame.width() == 0 || frame.height() == 0 {
            return Err(CaptureError::NoFrame);
        }

        let mut image_bytes = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut image_bytes, self.quality);
            encoder
                .encode_image(&frame)
                .map_err(|e| CaptureError::Encode(e.to_string()))?;
        }

        let snapshot = Snapshot::new(image_bytes, SNAPSHOT_MIME_TYPE);
        if snapshot.is_empty() {
            return Err(CaptureError::Encode("encoder produced no image data".to_string()));
        }

        Ok(snapshot)
    }
}

/// Frame source backed by a single still image
///
/// Stands in for a camera when running headless. Clearing it behaves like
/// a revoked device.
#[derive(Default)]
pub struct StillImageSource {
    frame: RwLock<Option<RgbImage>>,
}

impl StillImageSource {
    /// A source with no active frame
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_image(frame: RgbImage) -> Self {
        Self {
            frame: RwLock::new(Some(frame)),
        }
    }

    /// Load the frame from an image file on disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let frame = image::open(path)
            .with_context(|| format!("Failed to load snapshot source: {}", path.display()))?
            .to_rgb8();

        Ok(Self::from_image(frame))
    }

    /// Replace the displayed frame
    pub fn set_frame(&self, frame: RgbImage) {
        match self.frame.write() {
            Ok(mut guard) => *guard = Some(frame),
            Err(poisoned) => *poisoned.into_inner() = Some(frame),
        }
    }

    /// Drop the displayed frame
    pub fn clear(&self) {
        match self.frame.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

impl FrameSource for StillImageSource {
    fn current_frame(&self) -> Option<RgbImage> {
        match self.frame.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
