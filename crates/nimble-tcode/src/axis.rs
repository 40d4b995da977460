//! Per-channel ramp state.
//!
//! An [`Axis`] holds one ramp: a start value and time, a stop value and time,
//! and the easing used to interpolate between them. It never reads a clock;
//! every operation takes the current time in milliseconds.
//!
//! # RT Safety
//!
//! - No heap allocation after construction (the name is set at registration)
//! - O(1) for every operation

use serde::{Deserialize, Serialize};

use crate::easing::{DefaultEasing, EasingMath, EasingType, RampSpan, map_linear};

/// Lowest commandable axis value.
pub const AXIS_MIN: i32 = 0;

/// Highest commandable axis value.
pub const AXIS_MAX: i32 = 9999;

/// Value every axis holds before its first command, and the answer for reads
/// of an unknown channel.
pub const AXIS_DEFAULT_VALUE: i32 = 5000;

/// Largest accepted interval or speed magnitude.
pub const EXTENSION_MAX: u32 = 9_999_999;

/// Floor of the automatic smoothing interval (ms).
pub const MIN_SMOOTH_INTERVAL_MS: u32 = 3;

/// Ceiling of the automatic smoothing interval (ms).
pub const MAX_SMOOTH_INTERVAL_MS: u32 = 100;

/// How the duration of a new ramp is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RampExtension {
    /// Use the automatic smoothing interval.
    #[default]
    None,
    /// Reach the target after this many milliseconds.
    Interval(u32),
    /// Travel at this many units per 100 ms.
    Speed(u32),
}

/// Snapshot of an axis ramp, for inspection and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ramp {
    pub start: i32,
    pub start_time_ms: u64,
    pub stop: i32,
    pub stop_time_ms: u64,
}

/// One logical channel.
#[derive(Debug, Clone)]
pub struct Axis {
    name: String,
    easing: EasingType,
    ramp_start: i32,
    ramp_start_time: u64,
    ramp_stop: i32,
    ramp_stop_time: u64,
    smooth_interval: u32,
    last_position: i32,
    last_command_time: u64,
}

impl Default for Axis {
    fn default() -> Self {
        Self::new()
    }
}

impl Axis {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            easing: EasingType::Linear,
            ramp_start: AXIS_DEFAULT_VALUE,
            ramp_start_time: 0,
            ramp_stop: AXIS_DEFAULT_VALUE,
            ramp_stop_time: 0,
            smooth_interval: MAX_SMOOTH_INTERVAL_MS,
            last_position: AXIS_DEFAULT_VALUE,
            last_command_time: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn easing(&self) -> EasingType {
        self.easing
    }

    pub fn set_easing(&mut self, easing: EasingType) {
        self.easing = easing;
    }

    /// Time of the last accepted [`Axis::set`].
    pub fn last_command_time(&self) -> u64 {
        self.last_command_time
    }

    /// Current automatic smoothing interval (ms).
    pub fn smooth_interval(&self) -> u32 {
        self.smooth_interval
    }

    pub fn ramp(&self) -> Ramp {
        Ramp {
            start: self.ramp_start,
            start_time_ms: self.ramp_start_time,
            stop: self.ramp_stop,
            stop_time_ms: self.ramp_stop_time,
        }
    }

    /// Start a new ramp toward `target`.
    ///
    /// `target` is clamped to `[0, 9999]` and the extension magnitude to
    /// `[0, 9_999_999]`. A zero speed cannot produce a duration, so the
    /// ramp completes immediately; the parser never forwards one.
    pub fn set(&mut self, target: i32, extension: RampExtension, now: u64) {
        let target = target.clamp(AXIS_MIN, AXIS_MAX);

        match extension {
            RampExtension::Speed(speed) => {
                let speed = speed.min(EXTENSION_MAX);
                self.ramp_start = self.position(now);
                let distance = u64::from((target - self.ramp_start).unsigned_abs());
                let duration = (distance * 100).checked_div(u64::from(speed)).unwrap_or(0);
                self.ramp_stop_time = now.saturating_add(duration);
            }
            RampExtension::Interval(interval) => {
                let interval = interval.min(EXTENSION_MAX);
                self.ramp_start = self.position(now);
                self.ramp_stop_time = now.saturating_add(u64::from(interval));
            }
            RampExtension::None => {
                self.adapt_smooth_interval(now);
                self.ramp_start = self.position(now);
                self.ramp_stop_time = now.saturating_add(u64::from(self.smooth_interval));
            }
        }

        self.ramp_start_time = now;
        self.ramp_stop = target;
        self.last_command_time = now;
    }

    // Nudges the interval by 1 ms toward the command arrival period, within
    // the floor and ceiling.
    fn adapt_smooth_interval(&mut self, now: u64) {
        let elapsed = now.saturating_sub(self.ramp_start_time);
        let interval = u64::from(self.smooth_interval);
        if elapsed > interval && self.smooth_interval < MIN_SMOOTH_INTERVAL_MS {
            self.smooth_interval += 1;
        } else if elapsed < interval && self.smooth_interval > MAX_SMOOTH_INTERVAL_MS {
            self.smooth_interval -= 1;
        }
    }

    /// Interpolated position at `now`, always within `[0, 9999]`.
    pub fn position(&self, now: u64) -> i32 {
        self.position_with::<DefaultEasing>(now)
    }

    /// [`Axis::position`] with an explicit easing backend.
    pub fn position_with<E: EasingMath>(&self, now: u64) -> i32 {
        let value = if now > self.ramp_stop_time {
            self.ramp_stop
        } else if now > self.ramp_start_time {
            let span = RampSpan {
                input: to_i64(now),
                input_start: to_i64(self.ramp_start_time),
                input_end: to_i64(self.ramp_stop_time),
                output_start: self.ramp_start,
                output_end: self.ramp_stop,
            };
            let mapped = match self.easing {
                EasingType::Linear | EasingType::None => map_linear(span),
                easing => E::map(easing, span),
            };
            mapped.unwrap_or(self.ramp_stop)
        } else {
            self.ramp_start
        };
        value.clamp(AXIS_MIN, AXIS_MAX)
    }

    /// Freeze the axis at its current position.
    pub fn stop(&mut self, now: u64) {
        self.ramp_start = self.position(now);
        self.ramp_start_time = now;
        self.ramp_stop = self.ramp_start;
        self.ramp_stop_time = now;
    }

    /// `true` when the position differs from the value seen by the previous
    /// call; the new value becomes the reference.
    pub fn changed(&mut self, now: u64) -> bool {
        let position = self.position(now);
        if position != self.last_position {
            self.last_position = position;
            true
        } else {
            false
        }
    }
}

fn to_i64(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn prop_position_always_in_range(
            target in -20_000i32..20_000,
            interval in 0u32..5000,
            at in 0u64..10_000,
            easing in prop_oneof![
                Just(EasingType::Linear),
                Just(EasingType::EaseIn),
                Just(EasingType::EaseOut),
                Just(EasingType::EaseInOut),
                Just(EasingType::None),
            ],
        ) {
            let mut axis = Axis::new();
            axis.set_easing(easing);
            axis.set(target, RampExtension::Interval(interval), 0);
            let position = axis.position(at);
            prop_assert!((AXIS_MIN..=AXIS_MAX).contains(&position));
        }

        #[test]
        fn prop_linear_ramp_is_monotonic(
            target in 0i32..=9999,
            interval in 1u32..2000,
        ) {
            let mut axis = Axis::new();
            axis.set(target, RampExtension::Interval(interval), 0);
            let ascending = target >= AXIS_DEFAULT_VALUE;
            let mut previous = axis.position(0);
            for now in 1..=u64::from(interval) + 1 {
                let position = axis.position(now);
                if ascending {
                    prop_assert!(position >= previous);
                } else {
                    prop_assert!(position <= previous);
                }
                previous = position;
            }
            prop_assert_eq!(previous, target);
        }

        #[test]
        fn prop_stop_is_idempotent(
            target in 0i32..=9999,
            interval in 0u32..2000,
            at in 0u64..3000,
        ) {
            let mut axis = Axis::new();
            axis.set(target, RampExtension::Interval(interval), 0);
            axis.stop(at);
            let first = axis.ramp();
            axis.stop(at);
            prop_assert_eq!(axis.ramp(), first);
        }
    }
}
