use serde::Serialize;
use uuid::Uuid;

use crate::error::PipelineError;

/// Stage of a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// No run in flight
    Idle,
    /// Grabbing a still frame
    Capturing,
    /// Waiting on the validation endpoint
    Submitting,
    /// Waiting on the wallet endpoint
    Fetching,
    /// Run finished with points and balance
    Complete,
    /// Run stopped at a capture, submission or fetch error
    Failed,
}

/// Terminal record of one pipeline run, handed to observers
///
/// Partial results survive failures: the barcode is always present, and
/// `points_awarded` is kept when only the balance refresh failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    /// Correlates the record with the run's log lines
    pub run_id: Uuid,

    pub barcode: String,

    pub points_awarded: Option<u64>,

    pub reward_balance: Option<u64>,

    pub error: Option<PipelineError>,
}

impl ScanOutcome {
    pub fn new(run_id: Uuid, barcode: impl Into<String>) -> Self {
        Self {
            run_id,
            barcode: barcode.into(),
            points_awarded: None,
            reward_balance: None,
            error: None,
        }
    }

    /// Record the terminal error of the run
    pub fn fail(mut self, error: impl Into<PipelineError>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Terminal stage this outcome corresponds to
    pub fn stage(&self) -> PipelineStage {
        if self.is_success() {
            PipelineStage::Complete
        } else {
            PipelineStage::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CaptureError;

    #[test]
    fn test_failed_outcome_keeps_barcode() {
        let outcome = ScanOutcome::new(Uuid::new_v4(), "4006381333931").fail(CaptureError::NoFrame);
        assert_eq!(outcome.barcode, "4006381333931");
        assert_eq!(outcome.stage(), PipelineStage::Failed);
        assert_eq!(
            outcome.error,
            Some(PipelineError::Capture(CaptureError::NoFrame))
        );
    }
}
