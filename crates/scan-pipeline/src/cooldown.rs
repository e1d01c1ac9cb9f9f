//! Cooldown gate guarding re-entry into the scan pipeline
//!
//! The decode loop fires far faster than a proof round-trip completes, so
//! every accepted scan closes the gate for a fixed window. The flag is flipped
//! with a single compare-and-swap; a read-then-write check would let two
//! concurrent decode events both through.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default window during which further scans are ignored
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1000);

/// Admission control for scan events
#[derive(Debug, Clone)]
pub struct CooldownGate {
    armed: Arc<AtomicBool>,
    window: Duration,
}

impl CooldownGate {
    /// Create an armed gate with the given cooldown window
    pub fn new(window: Duration) -> Self {
        Self {
            armed: Arc::new(AtomicBool::new(true)),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether the next scan would be accepted
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Try to admit a scan
    ///
    /// Returns `true` at most once per window. A successful acquire schedules
    /// exactly one release after the window elapses, whatever happens to the
    /// run it admitted. Must be called from within a tokio runtime.
    pub fn try_acquire(&self) -> bool {
        if self
            .armed
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        // Anchored to the acceptance, not to when the release task first runs
        let deadline = Instant::now() + self.window;
        let armed = self.armed.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            release(&armed);
        });

        true
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

fn release(armed: &AtomicBool) {
    armed.store(true, Ordering::SeqCst);
    debug!("Cooldown released, accepting scans");
}
