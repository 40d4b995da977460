//! Per-tick frame mixer.
//!
//! Turns TCode axis samples (all in `0..=9999`) into the command frame sent
//! to the actuator:
//!
//! 1. Stroke axis maps onto `[-max_position, max_position]`.
//! 2. A sine vibration overlay is added when both amplitude and speed are
//!    non-zero. The target is pushed away from a travel bound by the
//!    amplitude so the overlay is never clipped.
//! 3. The sum is slew limited against the previously sent position.
//! 4. Air is a three-way split around the axis midpoint, force is a linear
//!    remap onto the actuator force range.
//!
//! While stopped the mixer sends idle force, no air flow and repeats the last
//! sent position.
//!
//! # RT Safety
//!
//! [`FrameMixer::tick`] does no allocation and no I/O.

use nimble_link::CommandFrame;
use nimble_tcode::easing::{RampSpan, map_linear};
use nimble_tcode::{AXIS_DEFAULT_VALUE, AXIS_MAX};

use crate::config::ControlConfig;
use crate::slew::SlewLimiter;

/// Raw axis values read from the TCode registry for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSamples {
    pub stroke: i32,
    pub vibration_amplitude: i32,
    pub vibration_speed: i32,
    pub air: i32,
    pub force: i32,
}

impl Default for AxisSamples {
    /// Values the controller registers at start-up: centred stroke, no
    /// vibration, air valve closed, full force, full vibration speed.
    fn default() -> Self {
        Self {
            stroke: AXIS_DEFAULT_VALUE,
            vibration_amplitude: 0,
            vibration_speed: AXIS_MAX,
            air: AXIS_DEFAULT_VALUE,
            force: AXIS_MAX,
        }
    }
}

/// Air valve request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AirFlow {
    Out,
    #[default]
    Neutral,
    In,
}

impl AirFlow {
    /// Below the axis midpoint lets air out, above lets air in.
    pub fn from_axis(value: i32) -> Self {
        match value.cmp(&AXIS_DEFAULT_VALUE) {
            std::cmp::Ordering::Less => AirFlow::Out,
            std::cmp::Ordering::Equal => AirFlow::Neutral,
            std::cmp::Ordering::Greater => AirFlow::In,
        }
    }

    pub fn sign(self) -> i8 {
        match self {
            AirFlow::Out => -1,
            AirFlow::Neutral => 0,
            AirFlow::In => 1,
        }
    }
}

/// Mixer state after the most recent tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    /// Stroke target before the vibration overlay.
    pub target: i32,
    /// Target plus overlay, before slew limiting.
    pub position: i32,
    /// Position last sent while running.
    pub last_position: i32,
    pub vibration_offset: i32,
    pub vibration_amplitude: i32,
    pub vibration_speed_hz: f32,
    pub force: i32,
    pub air: AirFlow,
}

#[derive(Debug, Clone)]
pub struct FrameMixer {
    max_position: i32,
    max_amplitude: i32,
    max_speed_hz: f32,
    idle_force: i32,
    max_force: i32,
    slew: SlewLimiter,
    state: FrameState,
}

impl FrameMixer {
    pub fn new(config: &ControlConfig) -> Self {
        let mut mixer = Self {
            max_position: config.actuator_max_position,
            max_amplitude: config.vibration_max_amplitude,
            max_speed_hz: config.vibration_max_speed_hz,
            idle_force: config.idle_force,
            max_force: config.max_force,
            slew: SlewLimiter::new(config.max_position_delta, 0),
            state: FrameState {
                target: 0,
                position: 0,
                last_position: 0,
                vibration_offset: 0,
                vibration_amplitude: 0,
                vibration_speed_hz: config.vibration_max_speed_hz,
                force: config.max_force,
                air: AirFlow::Neutral,
            },
        };
        mixer.reset_state();
        mixer
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    /// Centre the target, full force, air closed, vibration off at full
    /// speed. The last sent position is kept so the slew limit still holds.
    pub fn reset_state(&mut self) {
        self.state.target = 0;
        self.state.force = self.max_force;
        self.state.air = AirFlow::Neutral;
        self.state.vibration_speed_hz = self.max_speed_hz;
        self.state.vibration_amplitude = 0;
    }

    pub fn set_vibration_speed(&mut self, hz: f32) {
        self.state.vibration_speed_hz = if hz.is_nan() {
            0.0
        } else {
            hz.clamp(0.0, self.max_speed_hz)
        };
    }

    pub fn set_vibration_amplitude(&mut self, amplitude: i32) {
        self.state.vibration_amplitude = amplitude.clamp(0, self.max_amplitude);
    }

    /// Convert raw axis values into targets.
    pub fn apply_samples(&mut self, samples: &AxisSamples) {
        let max_centi_hz = (self.max_speed_hz * 100.0) as i32;
        let centi_hz = remap(samples.vibration_speed, 0, max_centi_hz);
        self.state.vibration_speed_hz = centi_hz as f32 / 100.0;

        self.state.target = remap(samples.stroke, -self.max_position, self.max_position);
        self.state.vibration_amplitude = remap(samples.vibration_amplitude, 0, self.max_amplitude);
        self.state.air = AirFlow::from_axis(samples.air);
        self.state.force = remap(samples.force, 0, self.max_force);
    }

    /// Sine overlay at `now_ms` for the current amplitude and speed.
    pub fn vibration_offset(&self, now_ms: u64) -> i32 {
        vibration_offset(
            self.state.vibration_amplitude,
            self.state.vibration_speed_hz,
            now_ms,
        )
    }

    /// Recompute the unlimited output position. Returns it.
    pub fn mix(&mut self, now_ms: u64) -> i32 {
        let amplitude = self.state.vibration_amplitude;
        self.state.vibration_offset = self.vibration_offset(now_ms);

        let target = self.state.target;
        let centred = if target - amplitude < -self.max_position {
            target + amplitude
        } else if target + amplitude > self.max_position {
            target - amplitude
        } else {
            target
        };
        self.state.position = centred + self.state.vibration_offset;
        self.state.position
    }

    /// Command frame for this tick. Only a running mixer advances the slew
    /// limiter.
    pub fn command_frame(&mut self, running: bool) -> CommandFrame {
        if running {
            self.state.last_position = self.slew.apply(self.state.position);
            CommandFrame {
                position: self.state.last_position,
                force: self.state.force,
                activated: true,
                air_out: self.state.air == AirFlow::Out,
                air_in: self.state.air == AirFlow::In,
            }
        } else {
            CommandFrame {
                position: self.state.last_position,
                force: self.idle_force,
                activated: false,
                air_out: false,
                air_in: false,
            }
        }
    }

    /// Samples in, command frame out.
    pub fn tick(&mut self, samples: &AxisSamples, now_ms: u64, running: bool) -> CommandFrame {
        self.apply_samples(samples);
        self.mix(now_ms);
        self.command_frame(running)
    }
}

/// `round(sin(phase) * amplitude)` with the phase taken in whole degrees of
/// the current period. Zero when either amplitude or speed is zero.
pub fn vibration_offset(amplitude: i32, speed_hz: f32, now_ms: u64) -> i32 {
    if amplitude <= 0 || speed_hz.is_nan() || speed_hz <= 0.0 {
        return 0;
    }
    let period_ms = ((1000.0 / speed_hz) as u64).max(1);
    let fraction = (now_ms % period_ms) as f32 / period_ms as f32;
    let degrees = (fraction * 360.0) as i32;
    ((degrees as f32).to_radians().sin() * amplitude as f32).round() as i32
}

/// Integer proportional map of an axis value onto `[out_min, out_max]`.
fn remap(value: i32, out_min: i32, out_max: i32) -> i32 {
    map_linear(RampSpan {
        input: i64::from(value),
        input_start: 0,
        input_end: i64::from(AXIS_MAX),
        output_start: out_min,
        output_end: out_max,
    })
    .unwrap_or(out_min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimble_link::IDLE_FORCE;

    fn mixer() -> FrameMixer {
        FrameMixer::new(&ControlConfig::default())
    }

    fn samples(stroke: i32) -> AxisSamples {
        AxisSamples {
            stroke,
            ..AxisSamples::default()
        }
    }

    #[test]
    fn test_reset_state() {
        let mixer = mixer();
        let state = mixer.state();
        assert_eq!(state.target, 0);
        assert_eq!(state.force, 1023);
        assert_eq!(state.air, AirFlow::Neutral);
        assert_eq!(state.vibration_amplitude, 0);
        assert!((state.vibration_speed_hz - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_stroke_mapping() {
        let mut mixer = mixer();
        mixer.apply_samples(&samples(0));
        assert_eq!(mixer.state().target, -1000);
        mixer.apply_samples(&samples(5000));
        assert_eq!(mixer.state().target, 0);
        mixer.apply_samples(&samples(9999));
        assert_eq!(mixer.state().target, 1000);
    }

    #[test]
    fn test_speed_and_force_mapping() {
        let mut mixer = mixer();
        mixer.apply_samples(&AxisSamples {
            vibration_speed: 5000,
            force: 5000,
            vibration_amplitude: 9999,
            ..AxisSamples::default()
        });
        let state = mixer.state();
        assert!((state.vibration_speed_hz - 10.0).abs() < 1e-4);
        assert_eq!(state.force, 511);
        assert_eq!(state.vibration_amplitude, 25);
    }

    #[test]
    fn test_air_split_around_midpoint() {
        assert_eq!(AirFlow::from_axis(0), AirFlow::Out);
        assert_eq!(AirFlow::from_axis(4999), AirFlow::Out);
        assert_eq!(AirFlow::from_axis(5000), AirFlow::Neutral);
        assert_eq!(AirFlow::from_axis(5001), AirFlow::In);
        assert_eq!(AirFlow::In.sign(), 1);
        assert_eq!(AirFlow::Out.sign(), -1);
    }

    #[test]
    fn test_vibration_offset_quarter_period() {
        // 20 Hz: 50 ms period, 12.5 ms is a quarter but the period is whole
        // milliseconds so sample at 12 ms (86 degrees) and 25 ms (180).
        assert_eq!(vibration_offset(25, 20.0, 0), 0);
        assert_eq!(vibration_offset(25, 20.0, 12), 25);
        assert_eq!(vibration_offset(25, 20.0, 25), 0);
        assert_eq!(vibration_offset(25, 20.0, 38), -25);
        assert_eq!(vibration_offset(25, 20.0, 50), 0);
    }

    #[test]
    fn test_no_overlay_without_amplitude_or_speed() {
        assert_eq!(vibration_offset(0, 20.0, 12), 0);
        assert_eq!(vibration_offset(25, 0.0, 12), 0);
        assert_eq!(vibration_offset(25, f32::NAN, 12), 0);
    }

    #[test]
    fn test_headroom_shifts_target_off_bounds() {
        let mut mixer = mixer();
        mixer.apply_samples(&AxisSamples {
            stroke: 9999,
            vibration_amplitude: 9999,
            ..AxisSamples::default()
        });
        // Zero phase: only the headroom shift shows.
        assert_eq!(mixer.mix(0), 975);
        assert_eq!(mixer.mix(12), 1000);

        mixer.apply_samples(&AxisSamples {
            stroke: 0,
            vibration_amplitude: 9999,
            ..AxisSamples::default()
        });
        assert_eq!(mixer.mix(0), -975);
        assert_eq!(mixer.mix(38), -1000);
    }

    #[test]
    fn test_running_frame_is_slew_limited() {
        let mut mixer = mixer();
        let frame = mixer.tick(&samples(9999), 0, true);
        assert_eq!(frame.position, 50);
        assert_eq!(frame.force, 1023);
        assert!(frame.activated);
        assert!(!frame.air_in && !frame.air_out);

        let frame = mixer.tick(&samples(9999), 2, true);
        assert_eq!(frame.position, 100);
        assert_eq!(mixer.state().last_position, 100);
    }

    #[test]
    fn test_stopped_frame_is_idle_and_holds_position() {
        let mut mixer = mixer();
        mixer.tick(&samples(9999), 0, true);
        let frame = mixer.tick(
            &AxisSamples {
                stroke: 9999,
                air: 9999,
                ..AxisSamples::default()
            },
            2,
            false,
        );
        assert_eq!(frame.position, 50);
        assert_eq!(frame.force, IDLE_FORCE);
        assert!(!frame.activated);
        assert!(!frame.air_in && !frame.air_out);
        assert_eq!(mixer.state().last_position, 50);
        // The target still tracks the axis while stopped.
        assert_eq!(mixer.state().target, 1000);
    }

    #[test]
    fn test_setters_clamp() {
        let mut mixer = mixer();
        mixer.set_vibration_speed(99.0);
        assert!((mixer.state().vibration_speed_hz - 20.0).abs() < f32::EPSILON);
        mixer.set_vibration_speed(-1.0);
        assert!(mixer.state().vibration_speed_hz.abs() < f32::EPSILON);
        mixer.set_vibration_amplitude(400);
        assert_eq!(mixer.state().vibration_amplitude, 25);
    }
}
