//! LED indicator state.
//!
//! Pure functions from controller state to PWM duties; driving actual LEDs
//! is the host's business. The encoder ring has eight LEDs named by compass
//! point, plus one LED per serial link.

use nimble_tcode::easing::{RampSpan, map_linear};

/// Brightest ring duty. Higher duties look no brighter.
pub const LED_MAX_DUTY: u8 = 75;

/// Duty of a link LED while its peer is present.
pub const LINK_LED_DUTY: u8 = 50;

pub const RING_LED_COUNT: usize = 8;

/// Encoder ring LEDs, clockwise from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RingLed {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl RingLed {
    pub const ALL: [RingLed; RING_LED_COUNT] = [
        RingLed::N,
        RingLed::NE,
        RingLed::E,
        RingLed::SE,
        RingLed::S,
        RingLed::SW,
        RingLed::W,
        RingLed::NW,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Duties for every ring LED, indexed by [`RingLed::index`].
pub type RingDuties = [u8; RING_LED_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndicatorState {
    pub ring: RingDuties,
    pub actuator_link: u8,
    pub pendant_link: u8,
}

impl IndicatorState {
    pub fn ring_duty(&self, led: RingLed) -> u8 {
        self.ring[led.index()]
    }
}

/// Stroke direction and vibration phase on the ring.
///
/// A stroke below centre lights N, SE and SW; above centre lights NE, NW and
/// S. The vibration overlay lights W when negative and E when positive.
/// Brightness scales from 1 to [`LED_MAX_DUTY`] with the magnitude. With
/// `lit` false the ring is dark.
pub fn encoder_ring(
    position: i32,
    max_position: i32,
    vibration_offset: i32,
    max_amplitude: i32,
    lit: bool,
) -> RingDuties {
    let mut ring = [0; RING_LED_COUNT];
    if !lit {
        return ring;
    }

    let stroke_duty = scale_duty(position.unsigned_abs(), max_position);
    let stroke_leds: &[RingLed] = match position.signum() {
        -1 => &[RingLed::N, RingLed::SE, RingLed::SW],
        1 => &[RingLed::NE, RingLed::NW, RingLed::S],
        _ => &[],
    };
    for &led in stroke_leds {
        ring[led.index()] = stroke_duty;
    }

    let vibration_duty = scale_duty(vibration_offset.unsigned_abs(), max_amplitude);
    match vibration_offset.signum() {
        -1 => ring[RingLed::W.index()] = vibration_duty,
        1 => ring[RingLed::E.index()] = vibration_duty,
        _ => {}
    }
    ring
}

/// Bar-graph of `level` around the ring. Each LED covers one eighth of
/// `0..=255` and fades in across its segment.
pub fn level_display(level: u8) -> RingDuties {
    let mut ring = [0; RING_LED_COUNT];
    for (segment, duty) in ring.iter_mut().enumerate() {
        let low = segment as i64 * 32;
        let high = if segment + 1 == RING_LED_COUNT {
            255
        } else {
            low + 32
        };
        if i64::from(level) > low {
            let mapped = map_linear(RampSpan {
                input: i64::from(level),
                input_start: low,
                input_end: high,
                output_start: 0,
                output_end: i32::from(LED_MAX_DUTY),
            })
            .unwrap_or(0);
            *duty = clamp_duty(mapped);
        }
    }
    ring
}

pub fn link_duty(present: bool) -> u8 {
    if present { LINK_LED_DUTY } else { 0 }
}

fn scale_duty(magnitude: u32, full_scale: i32) -> u8 {
    let mapped = map_linear(RampSpan {
        input: i64::from(magnitude),
        input_start: 0,
        input_end: i64::from(full_scale),
        output_start: 1,
        output_end: i32::from(LED_MAX_DUTY),
    })
    .unwrap_or(1);
    clamp_duty(mapped)
}

fn clamp_duty(duty: i32) -> u8 {
    u8::try_from(duty.clamp(0, i32::from(LED_MAX_DUTY))).unwrap_or(LED_MAX_DUTY)
}
