//! Decode loop driver
//!
//! Drains decoded scan events in order and hands each one to the pipeline.
//! Runs are spawned, never awaited here, so a slow backend cannot stall the
//! decoder.

use greenproof_common::ScanEvent;
use tokio::sync::mpsc;
use tracing::info;

use crate::pipeline::RewardPipeline;

/// Counters for one pass of the decode loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Events read from the decoder
    pub received: u64,
    /// Events that started a pipeline run
    pub accepted: u64,
    /// Events dropped by the cooldown gate
    pub dropped: u64,
}

/// Feeds decoder output into a [`RewardPipeline`]
pub struct Scanner {
    pipeline: RewardPipeline,
}

impl Scanner {
    pub fn new(pipeline: RewardPipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &RewardPipeline {
        &self.pipeline
    }

    /// Consume events until the decoder closes its side of the channel
    ///
    /// In-flight runs are detached and keep going after this returns.
    pub async fn run(&self, mut events: mpsc::Receiver<ScanEvent>) -> ScanStats {
        let mut stats = ScanStats::default();

        while let Some(event) = events.recv().await {
            stats.received += 1;
            match self.pipeline.handle_scan(event) {
                Some(_run) => stats.accepted += 1,
                None => stats.dropped += 1,
            }
        }

        info!(
            received = stats.received,
            accepted = stats.accepted,
            dropped = stats.dropped,
            "Decoder closed, scan loop stopped"
        );

        stats
    }
}
