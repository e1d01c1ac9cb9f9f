//! Rewards Client
//!
//! Talks to the GreenProof backend on behalf of the scan pipeline:
//! - `POST /api/validate` submits a barcode + snapshot proof and returns the points awarded
//! - `GET /wallet/{pubkey}` returns the wallet's reward balance
//!
//! Every call is a single attempt. Transport, status and parse failures all
//! collapse into the call's error type, and retry policy is left to the caller.

pub mod client;
#[cfg(feature = "mock-backend")]
pub mod mock_backend;

use async_trait::async_trait;
use greenproof_common::{FetchError, ProofRequest, SubmissionError, ValidationResult, WalletBalance};

pub use client::{RewardsClient, SNAPSHOT_FILE_NAME};

/// Sends a proof to the validation endpoint
#[async_trait]
pub trait ProofSubmitter: Send + Sync {
    async fn submit(&self, request: ProofRequest) -> Result<ValidationResult, SubmissionError>;
}

/// Looks up a wallet's reward balance
#[async_trait]
pub trait BalanceFetcher: Send + Sync {
    async fn fetch(&self, wallet_address: &str) -> Result<WalletBalance, FetchError>;
}
