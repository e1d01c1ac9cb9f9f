//! Reward pipeline orchestrator
//!
//! One run per accepted scan: capture a snapshot, submit the proof, then
//! refresh the wallet balance. Every run ends in exactly one [`ScanOutcome`]
//! broadcast to observers; errors travel inside the outcome and never escape
//! the run's task.

use greenproof_common::{PipelineStage, ProofRequest, ScanEvent, ScanOutcome};
use rewards_client::{BalanceFetcher, ProofSubmitter, RewardsClient};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::capture::SnapshotCapturer;
use crate::cooldown::CooldownGate;

/// Outcome records buffered per slow observer before it starts lagging
const OUTCOME_CHANNEL_CAPACITY: usize = 16;

/// Scan-to-reward orchestrator
///
/// Cheap to clone; clones share the gate, the observers and the backend.
#[derive(Clone)]
pub struct RewardPipeline {
    inner: Arc<Inner>,
}

struct Inner {
    gate: CooldownGate,
    capturer: SnapshotCapturer,
    submitter: Arc<dyn ProofSubmitter>,
    fetcher: Arc<dyn BalanceFetcher>,
    wallet_address: String,
    outcomes: broadcast::Sender<ScanOutcome>,
    stage: watch::Sender<PipelineStage>,
}

impl RewardPipeline {
    pub fn new(
        wallet_address: impl Into<String>,
        gate: CooldownGate,
        capturer: SnapshotCapturer,
        submitter: Arc<dyn ProofSubmitter>,
        fetcher: Arc<dyn BalanceFetcher>,
    ) -> Self {
        let (outcomes, _) = broadcast::channel(OUTCOME_CHANNEL_CAPACITY);
        let (stage, _) = watch::channel(PipelineStage::Idle);

        Self {
            inner: Arc::new(Inner {
                gate,
                capturer,
                submitter,
                fetcher,
                wallet_address: wallet_address.into(),
                outcomes,
                stage,
            }),
        }
    }

    /// Pipeline that submits and fetches through one backend client
    pub fn with_client(
        wallet_address: impl Into<String>,
        gate: CooldownGate,
        capturer: SnapshotCapturer,
        client: RewardsClient,
    ) -> Self {
        let client = Arc::new(client);
        Self::new(wallet_address, gate, capturer, client.clone(), client)
    }

    pub fn wallet_address(&self) -> &str {
        &self.inner.wallet_address
    }

    /// Receive the outcome of every run that finishes after this call
    pub fn subscribe(&self) -> broadcast::Receiver<ScanOutcome> {
        self.inner.outcomes.subscribe()
    }

    /// Watch the stage of the current (or last) run
    pub fn stage(&self) -> watch::Receiver<PipelineStage> {
        self.inner.stage.subscribe()
    }

    /// Admit a decoded scan and start a run for it
    ///
    /// Returns `None` when the cooldown gate is closed; the event is dropped,
    /// not queued. Otherwise the run proceeds on its own task and the handle
    /// resolves to its outcome.
    pub fn handle_scan(&self, event: ScanEvent) -> Option<JoinHandle<ScanOutcome>> {
        if !self.inner.gate.try_acquire() {
            debug!(barcode = %event.barcode, "Cooldown active, dropping scan");
            return None;
        }

        let pipeline = self.clone();
        Some(tokio::spawn(async move { pipeline.run(event).await }))
    }

    /// Run the full workflow for one scan, bypassing the cooldown gate
    pub async fn run(&self, event: ScanEvent) -> ScanOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("scan", %run_id, barcode = %event.barcode);

        async move {
            let outcome = self.execute(run_id, event).await;

            match &outcome.error {
                None => info!(
                    points = ?outcome.points_awarded,
                    balance = ?outcome.reward_balance,
                    "Proof rewarded"
                ),
                Some(err) => warn!(
                    points = ?outcome.points_awarded,
                    error = %err,
                    "Scan run failed"
                ),
            }

            self.set_stage(outcome.stage());
            // No subscribers is not an error
            let _ = self.inner.outcomes.send(outcome.clone());

            outcome
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, run_id: Uuid, event: ScanEvent) -> ScanOutcome {
        let mut outcome = ScanOutcome::new(run_id, event.barcode.clone());

        self.set_stage(PipelineStage::Capturing);
        let snapshot = match self.inner.capturer.capture() {
            Ok(snapshot) => snapshot,
            Err(e) => return outcome.fail(e),
        };
        debug!(image_bytes = snapshot.len(), "Snapshot captured");

        self.set_stage(PipelineStage::Submitting);
        let request = ProofRequest::new(event.barcode, self.inner.wallet_address.clone(), snapshot);
        let validation = match self.inner.submitter.submit(request).await {
            Ok(validation) => validation,
            Err(e) => return outcome.fail(e),
        };
        outcome.points_awarded = Some(validation.points_awarded);
        debug!(
            points = validation.points_awarded,
            submission_id = ?validation.submission_id,
            "Proof accepted"
        );

        self.set_stage(PipelineStage::Fetching);
        match self.inner.fetcher.fetch(&self.inner.wallet_address).await {
            Ok(balance) => outcome.reward_balance = Some(balance.reward_balance),
            Err(e) => return outcome.fail(e),
        }

        outcome
    }

    fn set_stage(&self, stage: PipelineStage) {
        self.inner.stage.send_replace(stage);
    }
}
