//! Reconnect budget with linear, capped backoff.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// RetryBudget
// ============================================================================

/// Bounded counter of automatic reconnect attempts.
///
/// Attempt `k` (1-based) waits `min(base × k, cap)`. The counter only goes
/// back to zero through [`RetryBudget::reset`], which the transport calls on
/// a successful connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryBudget {
    attempts: u32,
    max_attempts: u32,
    base_delay: Duration,
    cap_delay: Duration,
}

impl RetryBudget {
    /// Creates a fresh budget.
    #[must_use]
    pub const fn new(base_delay: Duration, cap_delay: Duration, max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            base_delay,
            cap_delay,
        }
    }

    /// Consumes one attempt and returns its delay, or `None` when exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        self.attempts += 1;
        Some(self.delay_for(self.attempts))
    }

    /// Delay for the given 1-based attempt number.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt).min(self.cap_delay)
    }

    /// Clears the attempt counter.
    #[inline]
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Attempts consumed since the last reset.
    #[inline]
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Retry ceiling.
    #[inline]
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns `true` once no automatic attempt remains.
    #[inline]
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_growth_until_cap() {
        let mut budget = RetryBudget::new(Duration::from_secs(5), Duration::from_secs(30), 10);

        let delays: Vec<u64> = std::iter::from_fn(|| budget.next_delay())
            .map(|d| d.as_secs())
            .collect();

        assert_eq!(delays, vec![5, 10, 15, 20, 25, 30, 30, 30, 30, 30]);
        assert!(budget.is_exhausted());
        assert_eq!(budget.next_delay(), None);
    }

    #[test]
    fn test_reset_restores_budget() {
        let mut budget = RetryBudget::new(Duration::from_millis(100), Duration::from_secs(1), 2);
        budget.next_delay();
        budget.next_delay();
        assert!(budget.is_exhausted());

        budget.reset();
        assert_eq!(budget.attempts(), 0);
        assert_eq!(budget.next_delay(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_zero_ceiling_never_retries() {
        let mut budget = RetryBudget::new(Duration::from_secs(1), Duration::from_secs(1), 0);
        assert_eq!(budget.next_delay(), None);
    }

    #[test]
    fn test_delays_never_decrease() {
        let budget = RetryBudget::new(Duration::from_millis(700), Duration::from_millis(2000), 50);
        let delays: Vec<Duration> = (1..=50).map(|k| budget.delay_for(k)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }
}
