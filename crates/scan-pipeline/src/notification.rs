//! Reward notification countdown
//!
//! Shows the result of a run, decays a progress bar, and hides itself after
//! a fixed duration. The timer owns no pipeline state: it only reflects the
//! last outcome it was given, so a slow presentation layer cannot hold up
//! the pipeline.

use greenproof_common::ScanOutcome;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

/// Countdown timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationConfig {
    /// Time from show to automatic dismissal
    pub duration: Duration,
    /// Interval between progress decrements
    pub tick: Duration,
    /// Percentage points removed per tick
    pub decay_step: u8,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(5000),
            tick: Duration::from_millis(100),
            decay_step: 2,
        }
    }
}

/// What the presentation layer should render
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationState {
    pub visible: bool,
    /// Remaining display time, 100 when shown and 0 when hidden
    pub progress_percent: u8,
    /// Points awarded by the run being shown
    pub points: Option<u64>,
    /// Reward balance after the run being shown
    pub tokens: Option<u64>,
}

impl NotificationState {
    pub fn hidden() -> Self {
        Self::default()
    }
}

struct Shared {
    current: NotificationState,
    /// Bumped on every show and dismiss so a superseded countdown can tell
    /// it no longer owns the state
    epoch: u64,
}

/// Show/decay/hide state machine for the reward notification
#[derive(Clone)]
pub struct NotificationTimer {
    config: NotificationConfig,
    shared: Arc<Mutex<Shared>>,
    updates: Arc<watch::Sender<NotificationState>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl NotificationTimer {
    pub fn new(config: NotificationConfig) -> Self {
        let (updates, _) = watch::channel(NotificationState::hidden());
        Self {
            config,
            shared: Arc::new(Mutex::new(Shared {
                current: NotificationState::hidden(),
                epoch: 0,
            })),
            updates: Arc::new(updates),
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> NotificationConfig {
        self.config
    }

    /// Current notification state
    pub async fn snapshot(&self) -> NotificationState {
        self.shared.lock().await.current.clone()
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.updates.subscribe()
    }

    /// Whether a countdown is still scheduled
    pub async fn is_counting(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Show the notification at full progress and restart the countdown
    ///
    /// Showing while already visible replaces the content and starts both
    /// schedules over; countdowns never stack.
    pub async fn show(&self, points: Option<u64>, tokens: Option<u64>) {
        let mut ticker = self.ticker.lock().await;
        if let Some(handle) = ticker.take() {
            handle.abort();
        }

        let epoch = {
            let mut shared = self.shared.lock().await;
            shared.epoch += 1;
            shared.current = NotificationState {
                visible: true,
                progress_percent: 100,
                points,
                tokens,
            };
            self.updates.send_replace(shared.current.clone());
            shared.epoch
        };

        debug!(?points, ?tokens, "Showing reward notification");

        *ticker = Some(tokio::spawn(countdown(
            self.shared.clone(),
            self.updates.clone(),
            self.config,
            epoch,
        )));
    }

    /// Hide the notification now and cancel its countdown
    pub async fn dismiss(&self) {
        let mut ticker = self.ticker.lock().await;
        if let Some(handle) = ticker.take() {
            handle.abort();
        }

        let mut shared = self.shared.lock().await;
        shared.epoch += 1;
        if shared.current.visible {
            hide(&mut shared, &self.updates);
            debug!("Reward notification dismissed");
        }
    }

    /// Show a notification for every successfully completed run
    ///
    /// Failed runs, including ones that were awarded points before the
    /// balance refresh failed, leave the notification untouched. Runs until
    /// the pipeline side of the channel is dropped.
    pub fn bind(&self, mut outcomes: broadcast::Receiver<ScanOutcome>) -> JoinHandle<()> {
        let timer = self.clone();
        tokio::spawn(async move {
            loop {
                match outcomes.recv().await {
                    Ok(outcome) if outcome.is_success() => {
                        timer
                            .show(outcome.points_awarded, outcome.reward_balance)
                            .await;
                    }
                    Ok(outcome) => {
                        debug!(run_id = %outcome.run_id, "Run failed, no notification");
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Notification timer fell behind pipeline outcomes");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for NotificationTimer {
    fn default() -> Self {
        Self::new(NotificationConfig::default())
    }
}

fn hide(shared: &mut Shared, updates: &watch::Sender<NotificationState>) {
    shared.current = NotificationState::hidden();
    updates.send_replace(shared.current.clone());
}

/// Decay ticks plus one absolute dismissal, for a single show
async fn countdown(
    shared: Arc<Mutex<Shared>>,
    updates: Arc<watch::Sender<NotificationState>>,
    config: NotificationConfig,
    epoch: u64,
) {
    let tick = config.tick.max(Duration::from_millis(1));
    let start = Instant::now();
    let mut ticks = time::interval_at(start + tick, tick);
    let deadline = time::sleep_until(start + config.duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            biased;

            _ = &mut deadline => {
                let mut guard = shared.lock().await;
                if guard.epoch == epoch {
                    hide(&mut guard, &updates);
                    debug!("Reward notification timed out");
                }
                break;
            }
            _ = ticks.tick() => {
                let mut guard = shared.lock().await;
                if guard.epoch != epoch {
                    break;
                }
                let progress = guard.current.progress_percent.saturating_sub(config.decay_step);
                guard.current.progress_percent = progress;
                updates.send_replace(guard.current.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenproof_common::{FetchError, PipelineError};
    use uuid::Uuid;

    async fn advance(ms: u64) {
        time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_hidden() {
        let timer = NotificationTimer::default();
        assert_eq!(timer.snapshot().await, NotificationState::hidden());
        assert!(!timer.is_counting().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_starts_at_full_progress() {
        let timer = NotificationTimer::default();
        timer.show(Some(10), Some(250)).await;

        let state = timer.snapshot().await;
        assert!(state.visible);
        assert_eq!(state.progress_percent, 100);
        assert_eq!(state.points, Some(10));
        assert_eq!(state.tokens, Some(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_decays_two_per_tick() {
        let timer = NotificationTimer::default();
        timer.show(Some(1), None).await;

        advance(1050).await;
        assert_eq!(timer.snapshot().await.progress_percent, 80);

        advance(2500).await;
        assert_eq!(timer.snapshot().await.progress_percent, 30);

        advance(1400).await;
        let state = timer.snapshot().await;
        assert!(state.visible);
        assert_eq!(state.progress_percent, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hides_after_duration_without_dangling_timers() {
        let timer = NotificationTimer::default();
        timer.show(Some(10), Some(250)).await;

        advance(4990).await;
        assert!(timer.snapshot().await.visible);

        advance(20).await;
        assert_eq!(timer.snapshot().await, NotificationState::hidden());
        assert!(!timer.is_counting().await);

        // A later show behaves like the first one
        timer.show(Some(3), Some(253)).await;
        let state = timer.snapshot().await;
        assert!(state.visible);
        assert_eq!(state.progress_percent, 100);

        advance(1050).await;
        assert_eq!(timer.snapshot().await.progress_percent, 80);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_cancels_countdown() {
        let timer = NotificationTimer::default();
        let mut updates = timer.subscribe();
        timer.show(Some(5), None).await;

        advance(550).await;
        timer.dismiss().await;
        assert_eq!(timer.snapshot().await, NotificationState::hidden());
        assert!(!timer.is_counting().await);

        updates.borrow_and_update();
        advance(6000).await;
        assert!(!updates.has_changed().unwrap());
        assert_eq!(timer.snapshot().await, NotificationState::hidden());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reshow_restarts_instead_of_stacking() {
        let timer = NotificationTimer::default();
        timer.show(Some(1), None).await;

        advance(3050).await;
        assert_eq!(timer.snapshot().await.progress_percent, 40);

        timer.show(Some(2), None).await;
        assert_eq!(timer.snapshot().await.progress_percent, 100);

        // The first show's dismissal would have fired here
        advance(2010).await;
        let state = timer.snapshot().await;
        assert!(state.visible);
        assert_eq!(state.points, Some(2));
        assert_eq!(state.progress_percent, 60);

        advance(3010).await;
        assert!(!timer.snapshot().await.visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_timing() {
        let timer = NotificationTimer::new(NotificationConfig {
            duration: Duration::from_millis(1000),
            tick: Duration::from_millis(250),
            decay_step: 25,
        });
        timer.show(Some(1), Some(1)).await;

        advance(510).await;
        assert_eq!(timer.snapshot().await.progress_percent, 50);

        advance(500).await;
        assert!(!timer.snapshot().await.visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bind_shows_only_successful_outcomes() {
        let timer = NotificationTimer::default();
        let (tx, rx) = broadcast::channel(4);
        let binding = timer.bind(rx);

        // Points were awarded but the balance refresh failed
        let mut partial = ScanOutcome::new(Uuid::new_v4(), "0123456789012");
        partial.points_awarded = Some(7);
        partial.error = Some(PipelineError::Fetch(FetchError::Transport(
            "timed out".to_string(),
        )));
        tx.send(partial).unwrap();
        advance(10).await;
        assert_eq!(timer.snapshot().await, NotificationState::hidden());
        assert!(!timer.is_counting().await);

        let mut complete = ScanOutcome::new(Uuid::new_v4(), "0123456789012");
        complete.points_awarded = Some(10);
        complete.reward_balance = Some(250);
        tx.send(complete).unwrap();
        advance(10).await;

        let state = timer.snapshot().await;
        assert!(state.visible);
        assert_eq!(state.points, Some(10));
        assert_eq!(state.tokens, Some(250));

        drop(tx);
        binding.await.unwrap();
    }
}
