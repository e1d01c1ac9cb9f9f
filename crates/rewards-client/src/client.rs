//! Client for the GreenProof validation backend

use anyhow::{Context, Result};
use async_trait::async_trait;
use greenproof_common::{
    FetchError, ProofRequest, SubmissionError, ValidationResult, WalletBalance,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::{BalanceFetcher, ProofSubmitter};

/// File name attached to the snapshot part of a proof upload
pub const SNAPSHOT_FILE_NAME: &str = "snapshot.jpg";

/// Client for the proof validation and wallet endpoints
#[derive(Clone)]
pub struct RewardsClient {
    base_url: String,
    client: reqwest::Client,
}

/// Error body the backend sends with non-2xx statuses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Transport-level failure, before it is attributed to a specific call
#[derive(Debug)]
enum CallFailure {
    Transport(String),
    Status { status: u16, message: String },
    Decode(String),
}

impl From<CallFailure> for SubmissionError {
    fn from(failure: CallFailure) -> Self {
        match failure {
            CallFailure::Transport(msg) => SubmissionError::Transport(msg),
            CallFailure::Status { status, message } => SubmissionError::Status { status, message },
            CallFailure::Decode(msg) => SubmissionError::Decode(msg),
        }
    }
}

impl From<CallFailure> for FetchError {
    fn from(failure: CallFailure) -> Self {
        match failure {
            CallFailure::Transport(msg) => FetchError::Transport(msg),
            CallFailure::Status { status, message } => FetchError::Status { status, message },
            CallFailure::Decode(msg) => FetchError::Decode(msg),
        }
    }
}

impl RewardsClient {
    /// Create a new rewards client
    ///
    /// # Arguments
    /// * `base_url` - Root URL of the backend (e.g., "http://localhost:8888")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a proof for validation
    ///
    /// Sends one multipart request and never retries. The snapshot buffer is
    /// moved into the request body and dropped with it.
    pub async fn submit_proof(&self, request: ProofRequest) -> Result<ValidationResult, SubmissionError> {
        let url = self
            .endpoint(&["api", "validate"])
            .map_err(SubmissionError::Transport)?;

        let ProofRequest {
            barcode,
            wallet_address,
            image,
        } = request;

        debug!(
            "Submitting proof to {}: barcode={} image_bytes={}",
            url,
            barcode,
            image.len()
        );

        let image_part = Part::bytes(image.image_bytes)
            .file_name(SNAPSHOT_FILE_NAME)
            .mime_str(&image.mime_type)
            .map_err(|e| SubmissionError::Transport(format!("invalid snapshot MIME type: {}", e)))?;

        let form = Form::new()
            .text("barcode_id", barcode)
            .text("pubkey", wallet_address)
            .part("image", image_part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        Ok(read_json(response).await?)
    }

    /// Fetch the current reward balance of a wallet
    pub async fn fetch_balance(&self, wallet_address: &str) -> Result<WalletBalance, FetchError> {
        let url = self
            .endpoint(&["wallet", wallet_address])
            .map_err(FetchError::Transport)?;

        debug!("Fetching wallet balance from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(read_json(response).await?)
    }

    /// Check if the backend is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let url = self
            .endpoint(&["health"])
            .map_err(anyhow::Error::msg)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to reach rewards backend")?;

        Ok(response.status().is_success())
    }

    /// Build an endpoint URL below the base URL
    ///
    /// Segments are percent-encoded, so wallet addresses can never escape
    /// their path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| format!("invalid backend URL {}: {}", self.base_url, e))?;

        url.path_segments_mut()
            .map_err(|_| format!("backend URL cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }
}

#[async_trait]
impl ProofSubmitter for RewardsClient {
    async fn submit(&self, request: ProofRequest) -> Result<ValidationResult, SubmissionError> {
        self.submit_proof(request).await
    }
}

#[async_trait]
impl BalanceFetcher for RewardsClient {
    async fn fetch(&self, wallet_address: &str) -> Result<WalletBalance, FetchError> {
        self.fetch_balance(wallet_address).await
    }
}

/// Read a JSON body, collapsing status, transport and parse failures
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, CallFailure> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| CallFailure::Transport(e.to_string()))?;

    if !status.is_success() {
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
        return Err(CallFailure::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| CallFailure::Decode(e.to_string()))
}

/// Best available diagnostic from an error response body
fn error_message(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return Some(parsed.error);
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
