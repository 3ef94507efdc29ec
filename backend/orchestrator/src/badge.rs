use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

/// How long the new-result badge stays visible after a broadcast.
pub const BADGE_CLEAR_SECS: u64 = 10;

/// Transient "new result available" indicator.
///
/// Every broadcast marks the badge and schedules a clear; clears are
/// coalesced with a generation counter, so a broadcast landing inside the
/// window restarts the full ten seconds instead of being wiped early by the
/// previous broadcast's timer.
#[derive(Default)]
pub struct Badge {
    visible: AtomicBool,
    generation: AtomicU64,
}

impl Badge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    /// Show the badge and schedule its clear.
    pub fn mark(self: &Arc<Self>) {
        self.visible.store(true, Ordering::SeqCst);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Result badge set");

        let badge = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(BADGE_CLEAR_SECS)).await;
            // Only the newest broadcast's timer may clear.
            if badge.generation.load(Ordering::SeqCst) == generation {
                badge.visible.store(false, Ordering::SeqCst);
                debug!(generation, "Result badge cleared");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_badge_clears_after_window() {
        let badge = Arc::new(Badge::new());
        badge.mark();
        assert!(badge.is_visible());

        // Let the spawned clear register its sleep before moving the paused
        // clock; advance() bumps the clock before yielding.
        settle().await;
        tokio::time::advance(Duration::from_secs(BADGE_CLEAR_SECS + 1)).await;
        settle().await;
        assert!(!badge.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_broadcast_supersedes_pending_clear() {
        let badge = Arc::new(Badge::new());
        badge.mark();

        // Each mark spawns a timer task; yield so it registers its sleep
        // before the paused clock moves (advance() bumps the clock first).
        settle().await;
        tokio::time::advance(Duration::from_secs(5)).await;
        badge.mark();
        settle().await;

        // The first timer fires now but is stale; the badge stays visible.
        tokio::time::advance(Duration::from_secs(6)).await;
        settle().await;
        assert!(badge.is_visible());

        // The second timer clears at its own deadline.
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert!(!badge.is_visible());
    }
}
