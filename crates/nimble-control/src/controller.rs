//! The NimbleStroker controller.
//!
//! [`NimbleController`] owns the TCode engine, the frame mixer and the
//! actuator link. Hosts feed it command bytes as they arrive and call
//! [`NimbleController::tick`] once per tick period. Each tick samples the
//! axes, sends one command frame and drains whatever the actuator answered.
//!
//! Axis layout:
//!
//! | Axis | Name        | Meaning                                 |
//! |------|-------------|-----------------------------------------|
//! | `L0` | `Up`        | stroke position                         |
//! | `V0` | `Vibe`      | vibration amplitude                     |
//! | `A0` | `Air`       | air valve (0 out, 5000 closed, 9999 in) |
//! | `A1` | `Force`     | force limit                             |
//! | `A2` | `VibeSpeed` | vibration speed                         |

use std::sync::Arc;

use nimble_link::{CommandFrame, LinkChannel, LinkRole, LinkTransport};
use nimble_tcode::{
    AXIS_DEFAULT_VALUE, AXIS_MAX, CalibrationStore, Clock, EasingType, MessageSink, RampExtension,
    TCode,
};
use tracing::{debug, info, trace, warn};

use crate::config::ControlConfig;
use crate::error::ControlResult;
use crate::indicator::{IndicatorState, encoder_ring, link_duty};
use crate::mixer::{AxisSamples, FrameMixer, FrameState};
use crate::tick::TickFlag;

pub const STROKE_AXIS: &str = "L0";
pub const VIBRATION_AMPLITUDE_AXIS: &str = "V0";
pub const AIR_AXIS: &str = "A0";
pub const FORCE_AXIS: &str = "A1";
pub const VIBRATION_SPEED_AXIS: &str = "A2";

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub sent: CommandFrame,
    pub feedback_received: bool,
    pub link_present: bool,
}

pub struct NimbleController<T: LinkTransport> {
    config: ControlConfig,
    clock: Arc<dyn Clock>,
    tcode: TCode,
    mixer: FrameMixer,
    actuator: LinkChannel,
    transport: T,
    running: bool,
    temp_limiting: bool,
}

impl<T: LinkTransport> std::fmt::Debug for NimbleController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NimbleController")
            .field("running", &self.running)
            .field("actuator_present", &self.actuator.is_present())
            .field("frame", self.mixer.state())
            .finish_non_exhaustive()
    }
}

impl<T: LinkTransport> NimbleController<T> {
    pub fn new(
        config: ControlConfig,
        clock: Arc<dyn Clock>,
        sink: Box<dyn MessageSink>,
        calibration: Box<dyn CalibrationStore>,
        transport: T,
    ) -> ControlResult<Self> {
        config.validate()?;
        let tcode = TCode::new(config.tcode_config(), Arc::clone(&clock), sink, calibration)?;
        let mixer = FrameMixer::new(&config);
        let actuator = LinkChannel::with_timeout(LinkRole::Actuator, config.link_timeout_ms);
        Ok(Self {
            config,
            clock,
            tcode,
            mixer,
            actuator,
            transport,
            running: true,
            temp_limiting: false,
        })
    }

    /// Prepare calibration, reset the frame state and register the
    /// controller's axes at their resting values.
    pub fn init(&mut self) -> ControlResult<()> {
        self.tcode.init()?;
        self.reset_state();

        let axes = [
            (STROKE_AXIS, "Up", AXIS_DEFAULT_VALUE, Some(EasingType::EaseInOut)),
            (VIBRATION_AMPLITUDE_AXIS, "Vibe", 0, Some(EasingType::EaseInOut)),
            (AIR_AXIS, "Air", AXIS_DEFAULT_VALUE, None),
            (FORCE_AXIS, "Force", AXIS_MAX, None),
            (VIBRATION_SPEED_AXIS, "VibeSpeed", AXIS_MAX, None),
        ];
        for (id, name, value, easing) in axes {
            self.tcode.axis_register(id, name);
            self.tcode.axis_write(id, value, RampExtension::None);
            if let Some(easing) = easing {
                self.tcode.axis_easing_type(id, easing);
            }
        }
        info!(
            channels = self.config.channel_count,
            firmware = %self.config.firmware_id,
            "Controller initialised"
        );
        Ok(())
    }

    pub fn reset_state(&mut self) {
        self.mixer.reset_state();
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    pub fn tcode(&self) -> &TCode {
        &self.tcode
    }

    pub fn tcode_mut(&mut self) -> &mut TCode {
        &mut self.tcode
    }

    pub fn frame_state(&self) -> &FrameState {
        self.mixer.state()
    }

    pub fn mixer_mut(&mut self) -> &mut FrameMixer {
        &mut self.mixer
    }

    pub fn actuator(&self) -> &LinkChannel {
        &self.actuator
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn set_message_sink(&mut self, sink: Box<dyn MessageSink>) {
        self.tcode.set_message_sink(sink);
    }

    pub fn input_byte(&mut self, byte: u8) {
        self.tcode.input_byte(byte);
    }

    pub fn input_bytes(&mut self, bytes: &[u8]) {
        self.tcode.input_bytes(bytes);
    }

    pub fn input_line(&mut self, line: &str) {
        self.tcode.input_line(line);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        if !self.running {
            info!("Controller started");
        }
        self.running = true;
    }

    /// Stop driving the actuator and freeze every axis.
    pub fn stop(&mut self) {
        self.tcode.stop();
        if self.running {
            info!("Controller stopped");
        }
        self.running = false;
    }

    pub fn toggle(&mut self) {
        if self.running {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Encoder button: start/stop.
    pub fn on_button_press(&mut self) {
        debug!("Button pressed");
        self.toggle();
    }

    /// Read every mixer input from the axis registry.
    pub fn sample_axes(&self) -> AxisSamples {
        AxisSamples {
            stroke: self.tcode.axis_read(STROKE_AXIS),
            vibration_amplitude: self.tcode.axis_read(VIBRATION_AMPLITUDE_AXIS),
            vibration_speed: self.tcode.axis_read(VIBRATION_SPEED_AXIS),
            air: self.tcode.axis_read(AIR_AXIS),
            force: self.tcode.axis_read(FORCE_AXIS),
        }
    }

    /// Run one tick: mix, send a command frame, then take in feedback.
    pub fn tick(&mut self) -> ControlResult<TickReport> {
        let now = self.clock.now_ms();
        let samples = self.sample_axes();
        let frame = self.mixer.tick(&samples, now, self.running);
        *self.actuator.command_mut() = frame;
        self.actuator.send(&mut self.transport)?;

        let feedback_received = self.actuator.poll(&mut self.transport, now)?;
        if feedback_received {
            self.on_feedback();
        }
        trace!(
            position = frame.position,
            force = frame.force,
            air_in = frame.air_in,
            air_out = frame.air_out,
            feedback_received,
            "Tick"
        );
        Ok(TickReport {
            sent: frame,
            feedback_received,
            link_present: self.actuator.is_present(),
        })
    }

    /// Tick only when `flag` was raised since the last call.
    pub fn run_pending(&mut self, flag: &TickFlag) -> ControlResult<Option<TickReport>> {
        if flag.take() {
            self.tick().map(Some)
        } else {
            Ok(None)
        }
    }

    fn on_feedback(&mut self) {
        let limiting = self.actuator.feedback().temp_limiting;
        if limiting == self.temp_limiting {
            return;
        }
        self.temp_limiting = limiting;
        if limiting {
            warn!(
                stop = self.config.stop_on_temp_limit,
                "Actuator reports thermal limiting"
            );
            if self.config.stop_on_temp_limit {
                self.stop();
            }
        } else {
            info!("Actuator thermal limiting cleared");
        }
    }

    /// `true` while the last feedback frame reported thermal limiting.
    pub fn is_temp_limiting(&self) -> bool {
        self.temp_limiting
    }

    pub fn indicators(&self, ring_lit: bool, pendant_present: bool) -> IndicatorState {
        let state = self.mixer.state();
        IndicatorState {
            ring: encoder_ring(
                state.last_position,
                self.config.actuator_max_position,
                state.vibration_offset,
                self.config.vibration_max_amplitude,
                ring_lit,
            ),
            actuator_link: link_duty(self.actuator.is_present()),
            pendant_link: link_duty(pendant_present),
        }
    }

    pub fn log_frame_state(&self) {
        let state = self.mixer.state();
        let command = self.actuator.command();
        info!(
            vibration_amplitude = state.vibration_amplitude,
            vibration_speed_hz = state.vibration_speed_hz,
            target = state.target,
            position = state.position,
            force = command.force,
            air_in = command.air_in,
            air_out = command.air_out,
            temp_limiting = self.actuator.feedback().temp_limiting,
            "Frame state"
        );
    }
}
