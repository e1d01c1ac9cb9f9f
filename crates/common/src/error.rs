use thiserror::Error;

/// No usable frame could be turned into a snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Video source has no active frame")]
    NoFrame,

    #[error("Failed to encode frame: {0}")]
    Encode(String),
}

/// Failure of the proof validation call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Validation request failed: {0}")]
    Transport(String),

    #[error("Validation rejected with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse validation response: {0}")]
    Decode(String),
}

/// Failure of the wallet balance lookup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Wallet lookup failed: {0}")]
    Transport(String),

    #[error("Wallet lookup returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse wallet response: {0}")]
    Decode(String),
}

/// Terminal error of a single pipeline run
///
/// Carried inside [`crate::ScanOutcome`] rather than returned, so every
/// variant is cheap to clone across broadcast receivers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = SubmissionError::Status {
            status: 404,
            message: "wallet not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Validation rejected with status 404: wallet not found"
        );
    }

    #[test]
    fn test_pipeline_error_is_transparent() {
        let err: PipelineError = FetchError::Decode("expected value".to_string()).into();
        assert_eq!(err.to_string(), "Failed to parse wallet response: expected value");
        assert!(matches!(err, PipelineError::Fetch(_)));
    }
}
