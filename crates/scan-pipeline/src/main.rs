//! Scan Agent
//!
//! Headless driver for the scan pipeline: barcodes are read line by line
//! from stdin, a still image stands in for the camera frame, and outcomes
//! and notification changes are logged.

use anyhow::{Context, Result};
use greenproof_common::ScanEvent;
use rewards_client::RewardsClient;
use scan_pipeline::{
    Config, CooldownGate, NotificationTimer, RewardPipeline, Scanner, SnapshotCapturer,
    StillImageSource,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scan_pipeline=debug,scan_agent=debug,rewards_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Starting Scan Agent");
    info!("Backend URL: {}", config.backend_url);
    info!("Cooldown: {:?}", config.cooldown);

    let source = match &config.snapshot_source {
        Some(path) => {
            info!("Using still image {} as camera frame", path.display());
            StillImageSource::open(path)?
        }
        None => {
            warn!("SNAPSHOT_SOURCE not set, every capture will fail with no frame");
            StillImageSource::empty()
        }
    };

    let client = RewardsClient::with_timeout(config.backend_url.clone(), config.request_timeout)?;

    // Check backend health
    info!("Checking rewards backend health...");
    match client.health_check().await {
        Ok(true) => info!("Rewards backend is healthy"),
        Ok(false) => warn!("Rewards backend returned non-success status"),
        Err(e) => warn!("Failed to connect to rewards backend: {}", e),
    }

    let pipeline = RewardPipeline::with_client(
        config.wallet_address.clone(),
        CooldownGate::new(config.cooldown),
        SnapshotCapturer::new(Arc::new(source)),
        client,
    );

    // Log every outcome
    let mut outcomes = pipeline.subscribe();
    tokio::spawn(async move {
        while let Ok(outcome) = outcomes.recv().await {
            match &outcome.error {
                None => info!(
                    "{} rewarded: +{} points, balance {}",
                    outcome.barcode,
                    outcome.points_awarded.unwrap_or_default(),
                    outcome.reward_balance.unwrap_or_default()
                ),
                Some(e) => warn!("{} not rewarded: {}", outcome.barcode, e),
            }
        }
    });

    // Notification timer follows the pipeline
    let notifications = NotificationTimer::new(config.notification());
    let _binding = notifications.bind(pipeline.subscribe());
    let mut notification_updates = notifications.subscribe();
    tokio::spawn(async move {
        let mut was_visible = false;
        while notification_updates.changed().await.is_ok() {
            let state = notification_updates.borrow_and_update().clone();
            if state.visible && !was_visible {
                info!(
                    "Notification shown: {} points, {} tokens",
                    state.points.unwrap_or_default(),
                    state.tokens.unwrap_or_default()
                );
            } else if !state.visible && was_visible {
                info!("Notification hidden");
            }
            was_visible = state.visible;
        }
    });

    // Decoder stand-in: one barcode per stdin line
    let (tx, rx) = mpsc::channel(32);
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            let barcode = line.trim();
            if barcode.is_empty() {
                continue;
            }
            if tx.send(ScanEvent::new(barcode)).await.is_err() {
                break;
            }
        }
        anyhow::Ok(())
    });

    info!("Scan agent ready, reading barcodes from stdin");

    let scanner = Scanner::new(pipeline);
    let stats = scanner.run(rx).await;

    reader.await.context("Barcode reader task panicked")??;

    info!(
        "Scan agent stopped: {} scans read, {} accepted, {} dropped",
        stats.received, stats.accepted, stats.dropped
    );

    Ok(())
}
