//! Scan Pipeline
//!
//! Turns decoded barcodes into rewarded proofs of environmental action.
//!
//! ## Architecture
//!
//! **Components:**
//! - `cooldown`: admission control, one accepted scan per window
//! - `capture`: still snapshot of the live video frame
//! - `pipeline`: per-scan orchestration (capture → submit → fetch balance)
//! - `scanner`: decode loop feeding the pipeline
//! - `notification`: show/decay/hide countdown for the result
//! - `config`: configuration management
//!
//! **Data Flow:**
//! 1. Decoder emits a `ScanEvent` → scanner hands it to the pipeline
//! 2. Cooldown gate admits it, or it is dropped
//! 3. Pipeline captures a snapshot and submits the proof
//! 4. Pipeline refreshes the wallet balance
//! 5. Outcome is broadcast → notification timer shows it

pub mod capture;
pub mod config;
pub mod cooldown;
pub mod notification;
pub mod pipeline;
pub mod scanner;

// Re-export commonly used types
pub use capture::{FrameSource, SnapshotCapturer, StillImageSource};
pub use config::Config;
pub use cooldown::CooldownGate;
pub use notification::{NotificationConfig, NotificationState, NotificationTimer};
pub use pipeline::RewardPipeline;
pub use scanner::{ScanStats, Scanner};
