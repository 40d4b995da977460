//! Tick flag shared between the timer context and the control loop.
//!
//! # RT Safety
//!
//! [`TickFlag::raise`] and [`TickFlag::take`] are each one atomic
//! read-modify-write: no locks, no allocation, safe from a timer callback.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// One-slot tick latch. The timer raises it, the loop reads and clears it.
///
/// # Example
///
/// ```rust
/// use nimble_control::TickFlag;
///
/// let flag = TickFlag::new();
/// flag.raise();
/// assert!(flag.take());
/// assert!(!flag.take());
/// ```
#[derive(Debug, Default)]
pub struct TickFlag {
    pending: AtomicBool,
    overruns: AtomicU64,
}

impl TickFlag {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            overruns: AtomicU64::new(0),
        }
    }

    /// Mark a tick due. Returns `false` when the previous tick had not been
    /// taken yet; that tick is folded into this one and counted as an overrun.
    pub fn raise(&self) -> bool {
        let was_pending = self.pending.swap(true, Ordering::AcqRel);
        if was_pending {
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }
        !was_pending
    }

    /// Read and clear in one step.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Ticks raised while the previous one was still pending.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_take_clears() {
        let flag = TickFlag::new();
        assert!(!flag.take());
        assert!(flag.raise());
        assert!(flag.is_pending());
        assert!(flag.take());
        assert!(!flag.is_pending());
        assert_eq!(flag.overruns(), 0);
    }

    #[test]
    fn test_double_raise_counts_overrun() {
        let flag = TickFlag::new();
        assert!(flag.raise());
        assert!(!flag.raise());
        assert_eq!(flag.overruns(), 1);
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn test_every_raise_is_taken_or_counted() {
        let flag = Arc::new(TickFlag::new());
        let raiser = {
            let flag = Arc::clone(&flag);
            thread::spawn(move || {
                for _ in 0..10_000 {
                    flag.raise();
                }
            })
        };

        let mut taken = 0u64;
        while !raiser.is_finished() {
            if flag.take() {
                taken += 1;
            }
        }
        assert!(raiser.join().is_ok());
        if flag.take() {
            taken += 1;
        }
        assert_eq!(taken + flag.overruns(), 10_000);
    }
}
