//! Sliding dispatch window

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Rolling record of recent dispatch times
///
/// Holds at most `rate` timestamps, newest last. The throttle is rate-bound
/// exactly when the window is full and its oldest entry is still younger
/// than the window duration. Timestamps use [`tokio::time::Instant`], which
/// follows the runtime's (possibly paused) clock.
#[derive(Debug, Default)]
pub struct DispatchWindow {
    times: VecDeque<Instant>,
}

impl DispatchWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dispatch at `now`, keeping only the most recent `rate` entries
    pub fn record(&mut self, now: Instant, rate: usize) {
        self.times.push_back(now);
        self.trim(rate);
    }

    /// Drop entries beyond the most recent `rate`
    pub fn trim(&mut self, rate: usize) {
        while self.times.len() > rate {
            self.times.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Oldest retained dispatch time
    pub fn oldest(&self) -> Option<Instant> {
        self.times.front().copied()
    }

    /// Whether dispatching now would exceed `rate` per `rate_per`
    ///
    /// An empty window is never rate-bound, whatever the configured rate.
    pub fn is_rate_bound(&self, now: Instant, rate: usize, rate_per: Duration) -> bool {
        if self.times.len() < rate {
            return false;
        }
        match self.oldest() {
            Some(oldest) => now.saturating_duration_since(oldest) < rate_per,
            None => false,
        }
    }

    /// Time until the oldest entry ages out of the window
    ///
    /// Zero when the window is empty or the oldest entry already aged out.
    pub fn time_until_free(&self, now: Instant, rate_per: Duration) -> Duration {
        match self.oldest() {
            Some(oldest) => rate_per.saturating_sub(now.saturating_duration_since(oldest)),
            None => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE_PER: Duration = Duration::from_millis(1_000);

    #[test]
    fn test_record_trims_to_rate() {
        let mut window = DispatchWindow::new();
        let t0 = Instant::now();
        for i in 0..5 {
            window.record(t0 + Duration::from_millis(i * 10), 3);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.oldest(), Some(t0 + Duration::from_millis(20)));
    }

    #[test]
    fn test_not_bound_below_rate() {
        let mut window = DispatchWindow::new();
        let t0 = Instant::now();
        window.record(t0, 3);
        window.record(t0 + Duration::from_millis(1), 3);
        assert!(!window.is_rate_bound(t0 + Duration::from_millis(2), 3, RATE_PER));
    }

    #[test]
    fn test_bound_when_full_and_fresh() {
        let mut window = DispatchWindow::new();
        let t0 = Instant::now();
        for i in 0..3 {
            window.record(t0 + Duration::from_millis(i), 3);
        }
        assert!(window.is_rate_bound(t0 + Duration::from_millis(500), 3, RATE_PER));
    }

    #[test]
    fn test_unbound_once_oldest_ages_out() {
        let mut window = DispatchWindow::new();
        let t0 = Instant::now();
        for i in 0..3 {
            window.record(t0 + Duration::from_millis(i), 3);
        }
        assert!(!window.is_rate_bound(t0 + Duration::from_millis(1_000), 3, RATE_PER));
    }

    #[test]
    fn test_empty_window_never_bound() {
        let window = DispatchWindow::new();
        let now = Instant::now();
        assert!(!window.is_rate_bound(now, 0, RATE_PER));
        assert!(!window.is_rate_bound(now, 40, RATE_PER));
    }

    #[test]
    fn test_rate_zero_keeps_window_empty() {
        let mut window = DispatchWindow::new();
        let t0 = Instant::now();
        window.record(t0, 0);
        assert_eq!(window.len(), 0);
        assert!(!window.is_rate_bound(t0, 0, RATE_PER));
    }

    #[test]
    fn test_time_until_free() {
        let mut window = DispatchWindow::new();
        let t0 = Instant::now();
        window.record(t0, 3);
        let now = t0 + Duration::from_millis(300);
        assert_eq!(window.time_until_free(now, RATE_PER), Duration::from_millis(700));
    }

    #[test]
    fn test_time_until_free_saturates() {
        let mut window = DispatchWindow::new();
        let t0 = Instant::now();
        window.record(t0, 3);
        let now = t0 + Duration::from_millis(5_000);
        assert_eq!(window.time_until_free(now, RATE_PER), Duration::ZERO);
        assert_eq!(DispatchWindow::new().time_until_free(now, RATE_PER), Duration::ZERO);
    }

    #[test]
    fn test_trim_after_rate_decrease() {
        let mut window = DispatchWindow::new();
        let t0 = Instant::now();
        for i in 0..5 {
            window.record(t0 + Duration::from_millis(i), 5);
        }
        window.trim(2);
        assert_eq!(window.len(), 2);
        assert_eq!(window.oldest(), Some(t0 + Duration::from_millis(3)));
    }
}
