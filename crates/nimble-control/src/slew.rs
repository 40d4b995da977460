//! Per-tick position slew limiting.
//!
//! The actuator is never asked to move further than `max_delta` position
//! units between two consecutive frames.

/// Slew limiter over integer actuator positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlewLimiter {
    max_delta: i32,
    previous: i32,
}

impl SlewLimiter {
    /// Start at `previous` with a per-tick limit of `max_delta` (at least 1).
    pub fn new(max_delta: i32, previous: i32) -> Self {
        Self {
            max_delta: max_delta.max(1),
            previous,
        }
    }

    pub fn max_delta(&self) -> i32 {
        self.max_delta
    }

    /// Last value returned by [`SlewLimiter::apply`].
    pub fn previous(&self) -> i32 {
        self.previous
    }

    /// Step toward `desired` by at most `max_delta`. The result becomes the
    /// new reference.
    pub fn apply(&mut self, desired: i32) -> i32 {
        let change = desired.saturating_sub(self.previous);
        let limited = change.clamp(-self.max_delta, self.max_delta);
        self.previous = self.previous.saturating_add(limited);
        self.previous
    }

    pub fn reset(&mut self, previous: i32) {
        self.previous = previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_change_passes_through() {
        let mut slew = SlewLimiter::new(50, 0);
        assert_eq!(slew.apply(30), 30);
        assert_eq!(slew.apply(-20), -20);
        assert_eq!(slew.previous(), -20);
    }

    #[test]
    fn test_large_change_is_limited() {
        let mut slew = SlewLimiter::new(50, 0);
        assert_eq!(slew.apply(1000), 50);
        assert_eq!(slew.apply(1000), 100);
        assert_eq!(slew.apply(-1000), 50);
    }

    #[test]
    fn test_exact_limit_allowed() {
        let mut slew = SlewLimiter::new(50, 100);
        assert_eq!(slew.apply(150), 150);
        assert_eq!(slew.apply(100), 100);
    }

    #[test]
    fn test_reaches_target() {
        let mut slew = SlewLimiter::new(50, -1000);
        let mut out = 0;
        for _ in 0..40 {
            out = slew.apply(1000);
        }
        assert_eq!(out, 1000);
    }

    #[test]
    fn test_non_positive_limit_floors_to_one() {
        let mut slew = SlewLimiter::new(0, 0);
        assert_eq!(slew.max_delta(), 1);
        assert_eq!(slew.apply(10), 1);
    }
}
