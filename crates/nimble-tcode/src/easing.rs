//! Ramp shaping functions.
//!
//! Every easing maps a time fraction `t` in `[0,1]` to a progress fraction in
//! `[0,1]`:
//!
//! - **Linear**: `t` (integer proportional map, no fraction involved)
//! - **EaseIn**: `t²`
//! - **EaseOut**: `1 - (1 - t)²`
//! - **EaseInOut**: `lerp(easeIn(t), easeOut(t), t)`
//!
//! The ease-in-out blend is not a textbook smoothstep; devices in the field
//! depend on its exact shape.
//!
//! Two arithmetic backends implement the same algebra with the same clamp
//! points: [`FloatEasing`] and the Q16.16 [`FixedEasing`]. The `fixed-point`
//! feature selects [`DefaultEasing`].

use serde::{Deserialize, Serialize};

use crate::fixed::Q16;

/// Easing applied to an axis ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EasingType {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// No marker; interpolates linearly.
    None,
}

/// Ramp input window and output span, in integer units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampSpan {
    pub input: i64,
    pub input_start: i64,
    pub input_end: i64,
    pub output_start: i32,
    pub output_end: i32,
}

/// Arithmetic backend for the non-linear easings.
pub trait EasingMath {
    /// Map `span.input` through `easing`. Returns `None` when the input window
    /// is empty.
    fn map(easing: EasingType, span: RampSpan) -> Option<i32>;
}

/// Integer proportional map, shared by both backends.
///
/// `(x - in_start) * (out_end - out_start) / (in_end - in_start) + out_start`
/// with truncating division.
pub fn map_linear(span: RampSpan) -> Option<i32> {
    let in_range = span.input_end - span.input_start;
    if in_range == 0 {
        return None;
    }
    let out_range = i64::from(span.output_end) - i64::from(span.output_start);
    let scaled = (span.input - span.input_start).checked_mul(out_range)? / in_range;
    i32::try_from(scaled + i64::from(span.output_start)).ok()
}

/// Single-precision float backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatEasing;

impl FloatEasing {
    pub fn lerp(start: f32, stop: f32, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        ((1.0 - t) * start) + (t * stop)
    }

    pub fn ease_in(t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        t * t
    }

    pub fn ease_out(t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        1.0 - ((1.0 - t) * (1.0 - t))
    }

    pub fn ease_in_out(t: f32) -> f32 {
        Self::lerp(Self::ease_in(t), Self::ease_out(t), t)
    }
}

impl EasingMath for FloatEasing {
    fn map(easing: EasingType, span: RampSpan) -> Option<i32> {
        let shape: fn(f32) -> f32 = match easing {
            EasingType::EaseIn => Self::ease_in,
            EasingType::EaseOut => Self::ease_out,
            EasingType::EaseInOut => Self::ease_in_out,
            EasingType::Linear | EasingType::None => return map_linear(span),
        };

        let in_range = span.input_end - span.input_start;
        if in_range == 0 {
            return None;
        }
        let mut t = (span.input - span.input_start) as f32;
        t /= in_range as f32;
        t = shape(t);
        t = t.clamp(0.0, 1.0);
        t *= (span.output_end - span.output_start) as f32;
        t += span.output_start as f32;
        t += 0.5;
        Some(t as i32)
    }
}

/// Q16.16 fixed-point backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedEasing;

impl FixedEasing {
    pub fn lerp(start: Q16, stop: Q16, t: Q16) -> Q16 {
        let t = t.clamp(Q16::ZERO, Q16::ONE);
        let tn = Q16::ONE - t;
        (tn * start) + (t * stop)
    }

    pub fn ease_in(t: Q16) -> Q16 {
        let t = t.clamp(Q16::ZERO, Q16::ONE);
        t * t
    }

    pub fn ease_out(t: Q16) -> Q16 {
        let t = t.clamp(Q16::ZERO, Q16::ONE);
        let inv = Q16::ONE - t;
        Q16::ONE - (inv * inv)
    }

    pub fn ease_in_out(t: Q16) -> Q16 {
        Self::lerp(Self::ease_in(t), Self::ease_out(t), t)
    }
}

impl EasingMath for FixedEasing {
    fn map(easing: EasingType, span: RampSpan) -> Option<i32> {
        let shape: fn(Q16) -> Q16 = match easing {
            EasingType::EaseIn => Self::ease_in,
            EasingType::EaseOut => Self::ease_out,
            EasingType::EaseInOut => Self::ease_in_out,
            EasingType::Linear | EasingType::None => return map_linear(span),
        };

        let mut t = Q16::ratio(
            span.input - span.input_start,
            span.input_end - span.input_start,
        )?;
        t = shape(t);
        t = t.clamp(Q16::ZERO, Q16::ONE);
        t = t * Q16::from_int(span.output_end - span.output_start);
        t = t + Q16::from_int(span.output_start);
        Some(t.to_int())
    }
}

#[cfg(not(feature = "fixed-point"))]
pub type DefaultEasing = FloatEasing;

#[cfg(feature = "fixed-point")]
pub type DefaultEasing = FixedEasing;
