//! Stateful endpoint of one physical link.
//!
//! A [`LinkChannel`] owns the receive window, the presence flag and the two
//! field sets of a link: the command fields (setpoints) and the feedback
//! fields (reported state). Which set an inbound frame updates depends on the
//! peer's [`LinkRole`]; the other set is what [`LinkChannel::outgoing_frame`]
//! encodes.
//!
//! Presence is the only liveness mechanism. When no valid frame has arrived
//! for longer than the timeout the channel is marked absent and both field
//! sets return to idle.

use tracing::{debug, info, warn};

use crate::error::{LinkError, LinkResult};
use crate::frame::{CommandFrame, FRAME_LEN, FeedbackFrame, FrameWindow};
use crate::transport::LinkTransport;

/// Milliseconds without a valid frame before a link is considered absent.
pub const DEFAULT_LINK_TIMEOUT_MS: u64 = 50;

/// What sits on the other end of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkRole {
    /// Reports feedback, receives commands.
    Actuator,
    /// Sends commands, receives feedback.
    Pendant,
}

#[derive(Debug)]
pub struct LinkChannel {
    role: LinkRole,
    window: FrameWindow,
    timeout_ms: u64,
    present: bool,
    last_valid_ms: u64,
    command: CommandFrame,
    feedback: FeedbackFrame,
    frames_received: u64,
}

impl LinkChannel {
    pub fn new(role: LinkRole) -> Self {
        Self::with_timeout(role, DEFAULT_LINK_TIMEOUT_MS)
    }

    pub fn with_timeout(role: LinkRole, timeout_ms: u64) -> Self {
        Self {
            role,
            window: FrameWindow::new(),
            timeout_ms,
            present: false,
            last_valid_ms: 0,
            command: CommandFrame::idle(),
            feedback: FeedbackFrame::default(),
            frames_received: 0,
        }
    }

    pub fn role(&self) -> LinkRole {
        self.role
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn command(&self) -> &CommandFrame {
        &self.command
    }

    pub fn command_mut(&mut self) -> &mut CommandFrame {
        &mut self.command
    }

    pub fn feedback(&self) -> &FeedbackFrame {
        &self.feedback
    }

    pub fn feedback_mut(&mut self) -> &mut FeedbackFrame {
        &mut self.feedback
    }

    /// Valid frames accepted since construction.
    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Mark the link absent and fall back to idle fields once the timeout has
    /// elapsed without a valid frame.
    pub fn check_timeout(&mut self, now_ms: u64) {
        if !self.present || now_ms.saturating_sub(self.last_valid_ms) <= self.timeout_ms {
            return;
        }
        warn!(
            role = ?self.role,
            silent_ms = now_ms.saturating_sub(self.last_valid_ms),
            "Link lost"
        );
        self.present = false;
        self.reset_fields();
    }

    fn reset_fields(&mut self) {
        self.command = CommandFrame::idle();
        self.feedback = FeedbackFrame::default();
    }

    /// Shift one byte into the window. Returns `true` when it completed a
    /// valid frame.
    pub fn receive_byte(&mut self, byte: u8, now_ms: u64) -> bool {
        // Checksum misses are routine while the window slides.
        let raw = match self.window.push(byte) {
            Ok(raw) => raw,
            Err(err @ LinkError::SystemType(_)) => {
                debug!(role = ?self.role, error = %err, "Rejected frame");
                return false;
            }
            Err(_) => return false,
        };

        match self.role {
            LinkRole::Actuator => self.feedback = FeedbackFrame::from_raw(&raw),
            LinkRole::Pendant => self.command = CommandFrame::from_raw(&raw),
        }
        self.last_valid_ms = now_ms;
        self.frames_received += 1;
        if !self.present {
            info!(role = ?self.role, "Link established");
            self.present = true;
        }
        true
    }

    pub fn receive(&mut self, bytes: &[u8], now_ms: u64) -> bool {
        let mut updated = false;
        for &byte in bytes {
            updated |= self.receive_byte(byte, now_ms);
        }
        updated
    }

    /// Apply the timeout, then drain every byte the transport has buffered.
    /// Returns `true` when at least one valid frame arrived.
    pub fn poll<T: LinkTransport + ?Sized>(
        &mut self,
        transport: &mut T,
        now_ms: u64,
    ) -> LinkResult<bool> {
        self.check_timeout(now_ms);
        let mut updated = false;
        while let Some(byte) = transport.read_byte()? {
            updated |= self.receive_byte(byte, now_ms);
        }
        if updated {
            debug!(role = ?self.role, "Frame received");
        }
        Ok(updated)
    }

    /// Frame for the peer: commands to an actuator, feedback to a pendant.
    pub fn outgoing_frame(&self) -> [u8; FRAME_LEN] {
        match self.role {
            LinkRole::Actuator => self.command.encode(),
            LinkRole::Pendant => self.feedback.encode(),
        }
    }

    pub fn send<T: LinkTransport + ?Sized>(&self, transport: &mut T) -> LinkResult<()> {
        transport.write_all(&self.outgoing_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::IDLE_FORCE;
    use crate::transport::QueueTransport;

    fn feedback_bytes(position: i32, temp_limiting: bool) -> [u8; FRAME_LEN] {
        FeedbackFrame {
            position,
            force: -40,
            activated: true,
            sensor_fault: false,
            temp_limiting,
        }
        .encode()
    }

    #[test]
    fn test_starts_absent_and_idle() {
        let channel = LinkChannel::new(LinkRole::Actuator);
        assert!(!channel.is_present());
        assert_eq!(channel.command().force, IDLE_FORCE);
        assert_eq!(channel.frames_received(), 0);
    }

    #[test]
    fn test_actuator_frame_updates_feedback() {
        let mut channel = LinkChannel::new(LinkRole::Actuator);
        assert!(channel.receive(&feedback_bytes(-300, true), 10));
        assert!(channel.is_present());
        assert_eq!(channel.feedback().position, -300);
        assert_eq!(channel.feedback().force, -40);
        assert!(channel.feedback().temp_limiting);
        assert_eq!(channel.command().force, IDLE_FORCE);
    }

    #[test]
    fn test_pendant_frame_updates_command() {
        let mut channel = LinkChannel::new(LinkRole::Pendant);
        let frame = CommandFrame {
            position: 500,
            force: 900,
            activated: true,
            air_out: true,
            air_in: false,
        };
        assert!(channel.receive(&frame.encode(), 0));
        assert_eq!(channel.command(), &frame);
    }

    #[test]
    fn test_timeout_resets_to_idle() {
        let mut channel = LinkChannel::new(LinkRole::Actuator);
        channel.command_mut().force = 1023;
        channel.command_mut().air_in = true;
        channel.receive(&feedback_bytes(100, false), 1000);

        channel.check_timeout(1050);
        assert!(channel.is_present());

        channel.check_timeout(1051);
        assert!(!channel.is_present());
        assert_eq!(channel.command(), &CommandFrame::idle());
        assert_eq!(channel.feedback(), &FeedbackFrame::default());
    }

    #[test]
    fn test_poll_drains_transport() -> LinkResult<()> {
        let mut channel = LinkChannel::new(LinkRole::Actuator);
        let mut transport = QueueTransport::new();
        transport.push_inbound(&[0xFF, 0x00]);
        transport.push_inbound(&feedback_bytes(7, false));
        assert!(channel.poll(&mut transport, 5)?);
        assert_eq!(channel.feedback().position, 7);
        assert!(!channel.poll(&mut transport, 6)?);
        Ok(())
    }

    #[test]
    fn test_send_writes_command_frame() -> LinkResult<()> {
        let mut channel = LinkChannel::new(LinkRole::Actuator);
        channel.command_mut().position = -12;
        let mut transport = QueueTransport::new();
        channel.send(&mut transport)?;
        assert_eq!(transport.take_outbound(), channel.command().encode().to_vec());
        Ok(())
    }
}
