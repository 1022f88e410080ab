//! Height-progress liveness tracking.

use std::time::Duration;
use tokio::time::Instant;

/// How long a peer may report no height progress before it is considered
/// stuck.
pub const STUCK_THRESHOLD: Duration = Duration::from_secs(20);

/// Tracks whether a peer is still making chain-height progress.
///
/// The stuck flag is edge-triggered: [`LivenessTracker::record_no_progress`]
/// returns true at most once per stuck episode, and a height advance resets
/// the episode silently.
#[derive(Debug, Clone)]
pub struct LivenessTracker {
    last_advance: Instant,
    is_stuck: bool,
}

impl LivenessTracker {
    pub fn new(now: Instant) -> Self {
        Self {
            last_advance: now,
            is_stuck: false,
        }
    }

    /// Record a height advance, clearing any stuck state.
    pub fn record_advance(&mut self, now: Instant) {
        self.last_advance = now;
        self.is_stuck = false;
    }

    /// Record a report that made no height progress.
    ///
    /// Returns true exactly when the peer first crosses the threshold;
    /// later no-progress reports within the same episode return false.
    pub fn record_no_progress(&mut self, now: Instant) -> bool {
        if !self.is_stuck && now.duration_since(self.last_advance) > STUCK_THRESHOLD {
            self.is_stuck = true;
            return true;
        }
        false
    }

    pub fn is_stuck(&self) -> bool {
        self.is_stuck
    }

    pub fn last_advance(&self) -> Instant {
        self.last_advance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn no_progress_within_threshold_is_not_stuck() {
        let start = Instant::now();
        let mut tracker = LivenessTracker::new(start);

        assert!(!tracker.record_no_progress(start + Duration::from_secs(10)));
        // The threshold is exclusive: exactly 20s elapsed is still fine.
        assert!(!tracker.record_no_progress(start + STUCK_THRESHOLD));
        assert!(!tracker.is_stuck());
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_fires_once_per_episode() {
        let start = Instant::now();
        let mut tracker = LivenessTracker::new(start);

        assert!(tracker.record_no_progress(start + Duration::from_secs(21)));
        assert!(tracker.is_stuck());
        // Still stuck, but the edge already fired.
        assert!(!tracker.record_no_progress(start + Duration::from_secs(30)));
        assert!(!tracker.record_no_progress(start + Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn advance_resets_the_episode() {
        let start = Instant::now();
        let mut tracker = LivenessTracker::new(start);

        assert!(tracker.record_no_progress(start + Duration::from_secs(25)));
        tracker.record_advance(start + Duration::from_secs(26));
        assert!(!tracker.is_stuck());

        // A fresh episode can trigger again, measured from the new advance.
        assert!(!tracker.record_no_progress(start + Duration::from_secs(40)));
        assert!(tracker.record_no_progress(start + Duration::from_secs(47)));
    }
}
