use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A barcode decoded from a single video frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// Decoded barcode text (EAN-13, UPC-A, Code 128 or QR payload)
    pub barcode: String,

    /// When the decoder produced this result
    pub observed_at: DateTime<Utc>,
}

impl ScanEvent {
    /// Create a scan event observed now
    pub fn new(barcode: impl Into<String>) -> Self {
        Self {
            barcode: barcode.into(),
            observed_at: Utc::now(),
        }
    }
}

/// Still image grabbed from the video source at scan time
#[derive(Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// Encoded image data
    pub image_bytes: Vec<u8>,

    /// MIME type of `image_bytes`
    pub mime_type: String,
}

impl Snapshot {
    pub fn new(image_bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            image_bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Size of the encoded image in bytes
    pub fn len(&self) -> usize {
        self.image_bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_bytes.is_empty()
    }
}

/// Proof of environmental action sent to the validation endpoint
///
/// Owns its snapshot, so the image buffer is released as soon as the
/// submission call that consumes the request returns.
#[derive(Debug)]
pub struct ProofRequest {
    pub barcode: String,
    pub wallet_address: String,
    pub image: Snapshot,
}

impl ProofRequest {
    pub fn new(barcode: impl Into<String>, wallet_address: impl Into<String>, image: Snapshot) -> Self {
        Self {
            barcode: barcode.into(),
            wallet_address: wallet_address.into(),
            image,
        }
    }
}
