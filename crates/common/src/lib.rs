pub mod error;
pub mod outcome;
pub mod reward;
pub mod scan;

pub use error::{CaptureError, FetchError, PipelineError, SubmissionError};
pub use outcome::{PipelineStage, ScanOutcome};
pub use reward::{ValidationResult, WalletBalance, POINTS_PER_TOKEN};
pub use scan::{ProofRequest, ScanEvent, Snapshot};
