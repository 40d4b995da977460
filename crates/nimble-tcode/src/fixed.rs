//! Q16.16 fixed-point arithmetic for targets without an FPU.
//!
//! The operations reproduce two's-complement 32-bit behaviour: sums and
//! products are computed in 64 bits and truncated back to 32, and
//! [`Q16::to_int`] rounds half up by adding 0.5 before the arithmetic shift.

use std::ops::{Add, Mul, Sub};

/// Number of fractional bits.
pub const FRACTION_BITS: u32 = 16;

/// A Q16.16 fixed-point value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Q16(i32);

impl Q16 {
    pub const ZERO: Q16 = Q16(0);
    pub const ONE: Q16 = Q16(1 << FRACTION_BITS);
    pub const HALF: Q16 = Q16(1 << (FRACTION_BITS - 1));

    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn from_int(value: i32) -> Self {
        Self(value.wrapping_shl(FRACTION_BITS))
    }

    pub fn from_f32(value: f32) -> Self {
        Self((value * Self::ONE.0 as f32) as i32)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / Self::ONE.0 as f32
    }

    /// Round to the nearest integer, halves rounding up.
    pub fn to_int(self) -> i32 {
        (self + Self::HALF).0 >> FRACTION_BITS
    }

    pub fn wrapping_add(self, other: Q16) -> Q16 {
        Q16((i64::from(self.0) + i64::from(other.0)) as i32)
    }

    pub fn wrapping_sub(self, other: Q16) -> Q16 {
        Q16(self.0.wrapping_sub(other.0))
    }

    pub fn wrapping_mul(self, other: Q16) -> Q16 {
        Q16(((i64::from(self.0) * i64::from(other.0)) >> FRACTION_BITS) as i32)
    }

    /// Fixed-point division, `None` when `divisor` is zero.
    pub fn checked_div(self, divisor: Q16) -> Option<Q16> {
        if divisor.0 == 0 {
            return None;
        }
        Some(Q16(((i64::from(self.0) << FRACTION_BITS) / i64::from(divisor.0)) as i32))
    }

    /// `numerator / denominator` as a Q16 fraction, computed from the integer
    /// operands directly.
    ///
    /// Equal to `from_int(n).checked_div(from_int(d))` whenever those
    /// conversions do not overflow, and still correct for ramps longer than
    /// 32767 ms where they would.
    pub fn ratio(numerator: i64, denominator: i64) -> Option<Q16> {
        if denominator == 0 {
            return None;
        }
        let scaled = numerator.checked_mul(1 << FRACTION_BITS)?;
        Some(Q16((scaled / denominator) as i32))
    }

    pub fn clamp(self, min: Q16, max: Q16) -> Q16 {
        if self < min {
            min
        } else if self > max {
            max
        } else {
            self
        }
    }
}

impl Add for Q16 {
    type Output = Q16;

    fn add(self, rhs: Q16) -> Q16 {
        self.wrapping_add(rhs)
    }
}

impl Sub for Q16 {
    type Output = Q16;

    fn sub(self, rhs: Q16) -> Q16 {
        self.wrapping_sub(rhs)
    }
}

impl Mul for Q16 {
    type Output = Q16;

    fn mul(self, rhs: Q16) -> Q16 {
        self.wrapping_mul(rhs)
    }
}
