//! Configuration management for the scan agent
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::notification::NotificationConfig;

/// Agent configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the rewards backend
    pub backend_url: String,

    /// Wallet address credited for accepted proofs
    pub wallet_address: String,

    /// Window after an accepted scan during which scans are ignored
    pub cooldown: Duration,

    /// How long a reward notification stays up
    pub notification_duration: Duration,

    /// Interval between notification progress decrements
    pub notification_tick: Duration,

    /// Progress removed per notification tick
    pub notification_decay_step: u8,

    /// Per-request timeout for backend calls
    pub request_timeout: Duration,

    /// Still image used as the camera frame when running headless
    pub snapshot_source: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            backend_url: env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:8888".to_string()),

            wallet_address: env::var("WALLET_ADDRESS").context("WALLET_ADDRESS is required")?,

            cooldown: millis_var("COOLDOWN_MS", 1000)?,

            notification_duration: millis_var("NOTIFICATION_DURATION_MS", 5000)?,

            notification_tick: millis_var("NOTIFICATION_TICK_MS", 100)?,

            notification_decay_step: env::var("NOTIFICATION_DECAY_STEP")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("Invalid NOTIFICATION_DECAY_STEP")?,

            request_timeout: Duration::from_secs(
                env::var("REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("Invalid REQUEST_TIMEOUT_SECS")?,
            ),

            snapshot_source: env::var("SNAPSHOT_SOURCE").ok().map(PathBuf::from),
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.wallet_address.trim().is_empty() {
            anyhow::bail!("WALLET_ADDRESS must not be empty");
        }

        if self.cooldown.is_zero() {
            anyhow::bail!("COOLDOWN_MS must be greater than 0");
        }

        if self.notification_tick.is_zero() {
            anyhow::bail!("NOTIFICATION_TICK_MS must be greater than 0");
        }

        if self.notification_duration.is_zero() {
            anyhow::bail!("NOTIFICATION_DURATION_MS must be greater than 0");
        }

        if self.notification_tick > self.notification_duration {
            anyhow::bail!("NOTIFICATION_TICK_MS must not exceed NOTIFICATION_DURATION_MS");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than 0");
        }

        Ok(())
    }

    /// Timing for the reward notification
    pub fn notification(&self) -> NotificationConfig {
        NotificationConfig {
            duration: self.notification_duration,
            tick: self.notification_tick,
            decay_step: self.notification_decay_step,
        }
    }
}

fn millis_var(name: &str, default: u64) -> Result<Duration> {
    let millis: u64 = match env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("Invalid {}", name))?,
        Err(_) => default,
    };
    Ok(Duration::from_millis(millis))
}
