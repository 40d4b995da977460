//! Software stand-in for an actuator.
//!
//! The simulator decodes every command frame written to it and queues one
//! feedback frame in reply. Its reported position follows the commanded
//! position at a bounded rate per frame.

use std::collections::VecDeque;

use tracing::trace;

use crate::error::LinkResult;
use crate::frame::{CommandFrame, FeedbackFrame, FrameWindow};
use crate::transport::LinkTransport;

/// Position units the simulated rod travels per received frame.
pub const DEFAULT_SIM_STEP: i32 = 20;

#[derive(Debug, Clone)]
pub struct SimulatedActuator {
    window: FrameWindow,
    position: i32,
    max_step: i32,
    temp_limiting: bool,
    sensor_fault: bool,
    silent: bool,
    last_command: Option<CommandFrame>,
    commands_received: u64,
    replies: VecDeque<u8>,
}

impl Default for SimulatedActuator {
    fn default() -> Self {
        Self::new(DEFAULT_SIM_STEP)
    }
}

impl SimulatedActuator {
    pub fn new(max_step: i32) -> Self {
        Self {
            window: FrameWindow::new(),
            position: 0,
            max_step: max_step.max(1),
            temp_limiting: false,
            sensor_fault: false,
            silent: false,
            last_command: None,
            commands_received: 0,
            replies: VecDeque::new(),
        }
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn last_command(&self) -> Option<&CommandFrame> {
        self.last_command.as_ref()
    }

    pub fn commands_received(&self) -> u64 {
        self.commands_received
    }

    /// Stop replying, as if the cable were unplugged. Commands are still
    /// decoded.
    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
        if silent {
            self.replies.clear();
        }
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn set_temp_limiting(&mut self, limiting: bool) {
        self.temp_limiting = limiting;
    }

    pub fn set_sensor_fault(&mut self, fault: bool) {
        self.sensor_fault = fault;
    }

    fn on_command(&mut self, command: CommandFrame) {
        let step = (command.position - self.position).clamp(-self.max_step, self.max_step);
        self.position += step;
        self.commands_received += 1;
        self.last_command = Some(command);
        trace!(
            commanded = command.position,
            position = self.position,
            "Simulated actuator step"
        );

        if self.silent {
            return;
        }
        let feedback = FeedbackFrame {
            position: self.position,
            force: command.force,
            activated: true,
            sensor_fault: self.sensor_fault,
            temp_limiting: self.temp_limiting,
        };
        self.replies.extend(feedback.encode());
    }
}

impl LinkTransport for SimulatedActuator {
    fn read_byte(&mut self) -> LinkResult<Option<u8>> {
        Ok(self.replies.pop_front())
    }

    fn write_all(&mut self, bytes: &[u8]) -> LinkResult<()> {
        for &byte in bytes {
            if let Ok(raw) = self.window.push(byte) {
                self.on_command(CommandFrame::from_raw(&raw));
            }
        }
        Ok(())
    }
}
