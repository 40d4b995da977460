//! 7-byte link frame encoding and decoding.
//!
//! ```text
//! byte 0  status: bit0..2 flags, bits 5..7 system type (0b100)
//! byte 1  position magnitude, low byte
//! byte 2  position magnitude, high bits 0..1; bit 2 = sign
//! byte 3  force magnitude, low byte
//! byte 4  force magnitude, high bits 0..1; bit 2 = sign
//! byte 5  checksum low   (sum of bytes 0..4)
//! byte 6  checksum high
//! ```
//!
//! Magnitudes are sign-and-magnitude, not two's complement. The upper bits of
//! bytes 2 and 4 carry a node type or noise and are masked off on receive.
//!
//! The same layout travels in both directions. Status flags mean
//! `activated | airOut | airIn` in a command frame and
//! `activated | sensorFault | tempLimiting` in a feedback frame.

use crate::error::{LinkError, LinkResult};

/// Bytes per frame.
pub const FRAME_LEN: usize = 7;

/// System-type tag carried in the top bits of every status byte.
pub const SYSTEM_TYPE_NIMBLE: u8 = 0x80;

/// Bits of the status byte holding the system type.
pub const SYSTEM_TYPE_MASK: u8 = 0xE0;

/// Bits of a high byte that belong to the value (two magnitude bits + sign).
pub const HIGH_BYTE_MASK: u8 = 0x07;

/// Sign bit of a 16-bit position or force word.
pub const SIGN_BIT: u16 = 0x0400;

/// Largest encodable magnitude.
pub const MAGNITUDE_MAX: u16 = 0x03FF;

/// Largest commanded position either side of centre.
pub const POSITION_MAX: i32 = 1000;

/// Centering force sent while nothing better is known.
pub const IDLE_FORCE: i32 = 200;

/// Full-scale force.
pub const MAX_FORCE: i32 = 1023;

pub const FLAG_ACTIVATED: u8 = 0x01;
pub const FLAG_AIR_OUT: u8 = 0x02;
pub const FLAG_AIR_IN: u8 = 0x04;
pub const FLAG_SENSOR_FAULT: u8 = 0x02;
pub const FLAG_TEMP_LIMITING: u8 = 0x04;

/// 16-bit sum of the five payload bytes.
pub fn checksum(payload: &[u8]) -> u16 {
    payload
        .iter()
        .take(5)
        .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)))
}

fn fold_sign(value: i32) -> (u8, u8) {
    let magnitude = u16::try_from(value.unsigned_abs())
        .unwrap_or(MAGNITUDE_MAX)
        .min(MAGNITUDE_MAX);
    let [low, high] = magnitude.to_le_bytes();
    let sign = if value < 0 { 0x04 } else { 0x00 };
    (low, high | sign)
}

fn unfold_sign(word: u16) -> i32 {
    if word & SIGN_BIT != 0 {
        -i32::from(word & !SIGN_BIT)
    } else {
        i32::from(word)
    }
}

/// Build a frame from the three status flag bits, a position and a force.
pub fn encode_frame(flags: u8, position: i32, force: i32) -> [u8; FRAME_LEN] {
    let (pos_low, pos_high) = fold_sign(position);
    let (force_low, force_high) = fold_sign(force);

    let mut out = [0u8; FRAME_LEN];
    out[0] = (flags & HIGH_BYTE_MASK) | SYSTEM_TYPE_NIMBLE;
    out[1] = pos_low;
    out[2] = pos_high;
    out[3] = force_low;
    out[4] = force_high;
    let [sum_low, sum_high] = checksum(&out[..5]).to_le_bytes();
    out[5] = sum_low;
    out[6] = sum_high;
    out
}

/// A frame that passed the checksum and system-type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    pub status: u8,
    pub position: i32,
    /// Force word with the sign bit still in place.
    pub force_word: u16,
}

impl RawFrame {
    pub fn flag(&self, mask: u8) -> bool {
        self.status & mask != 0
    }

    /// Force with the sign bit applied.
    pub fn force_signed(&self) -> i32 {
        unfold_sign(self.force_word)
    }

    /// Force read as an unsigned magnitude.
    pub fn force_unsigned(&self) -> i32 {
        i32::from(self.force_word)
    }
}

/// Validate and decode one aligned frame.
///
/// Rejects a checksum mismatch, a zero checksum (an all-zero window) and a
/// status byte whose system type is not `0b100`.
pub fn decode_frame(bytes: &[u8; FRAME_LEN]) -> LinkResult<RawFrame> {
    let expected = checksum(&bytes[..5]);
    let actual = u16::from_le_bytes([bytes[5], bytes[6]]);
    if actual != expected {
        return Err(LinkError::ChecksumMismatch { expected, actual });
    }
    if actual == 0 {
        return Err(LinkError::ZeroChecksum);
    }

    let status = bytes[0];
    if status & SYSTEM_TYPE_MASK != SYSTEM_TYPE_NIMBLE {
        return Err(LinkError::SystemType(status));
    }

    let position_word = u16::from_le_bytes([bytes[1], bytes[2] & HIGH_BYTE_MASK]);
    let force_word = u16::from_le_bytes([bytes[3], bytes[4] & HIGH_BYTE_MASK]);

    Ok(RawFrame {
        status,
        position: unfold_sign(position_word),
        force_word,
    })
}

/// Setpoints sent to an actuator (or received from a pendant).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    /// -1000..=1000
    pub position: i32,
    /// 0..=1023
    pub force: i32,
    pub activated: bool,
    pub air_out: bool,
    pub air_in: bool,
}

impl Default for CommandFrame {
    fn default() -> Self {
        Self::idle()
    }
}

impl CommandFrame {
    /// Centre position, idle force, valves closed.
    pub fn idle() -> Self {
        Self {
            position: 0,
            force: IDLE_FORCE,
            activated: false,
            air_out: false,
            air_in: false,
        }
    }

    pub fn flags(&self) -> u8 {
        u8::from(self.activated) | (u8::from(self.air_out) << 1) | (u8::from(self.air_in) << 2)
    }

    pub fn encode(&self) -> [u8; FRAME_LEN] {
        encode_frame(self.flags(), self.position, self.force)
    }

    /// Interpret a decoded frame as a command. Force carries no sign.
    pub fn from_raw(raw: &RawFrame) -> Self {
        Self {
            position: raw.position,
            force: raw.force_unsigned(),
            activated: raw.flag(FLAG_ACTIVATED),
            air_out: raw.flag(FLAG_AIR_OUT),
            air_in: raw.flag(FLAG_AIR_IN),
        }
    }
}

/// State reported by an actuator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackFrame {
    /// -1000..=1000
    pub position: i32,
    /// -1023..=1023
    pub force: i32,
    pub activated: bool,
    pub sensor_fault: bool,
    pub temp_limiting: bool,
}

impl FeedbackFrame {
    pub fn flags(&self) -> u8 {
        u8::from(self.activated)
            | (u8::from(self.sensor_fault) << 1)
            | (u8::from(self.temp_limiting) << 2)
    }

    pub fn encode(&self) -> [u8; FRAME_LEN] {
        encode_frame(self.flags(), self.position, self.force)
    }

    /// Interpret a decoded frame as feedback. Force is signed.
    pub fn from_raw(raw: &RawFrame) -> Self {
        Self {
            position: raw.position,
            force: raw.force_signed(),
            activated: raw.flag(FLAG_ACTIVATED),
            sensor_fault: raw.flag(FLAG_SENSOR_FAULT),
            temp_limiting: raw.flag(FLAG_TEMP_LIMITING),
        }
    }
}

/// Sliding 7-byte receive window.
///
/// Every byte shifts the window left by one and is decoded in place, so the
/// receiver locks onto frame boundaries without any framing bytes.
#[derive(Debug, Clone, Default)]
pub struct FrameWindow {
    bytes: [u8; FRAME_LEN],
}

impl FrameWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, byte: u8) -> LinkResult<RawFrame> {
        self.bytes.copy_within(1.., 0);
        self.bytes[FRAME_LEN - 1] = byte;
        decode_frame(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_frame_decodes() -> LinkResult<()> {
        let frame = [0x84, 0xE8, 0x03, 0x00, 0x00, 0x6F, 0x01];
        let raw = decode_frame(&frame)?;
        assert_eq!(raw.position, 1000);
        assert_eq!(raw.force_word, 0);
        assert_eq!(raw.status, 0x84);
        Ok(())
    }

    #[test]
    fn test_negative_position_sets_sign_bit() -> LinkResult<()> {
        let command = CommandFrame {
            position: -1000,
            force: 512,
            ..CommandFrame::idle()
        };
        let bytes = command.encode();
        assert_eq!(bytes[1], 0xE8);
        assert_eq!(bytes[2], 0x03 | 0x04);
        assert_eq!(CommandFrame::from_raw(&decode_frame(&bytes)?), command);
        Ok(())
    }

    #[test]
    fn test_magnitude_clamped_to_ten_bits() -> LinkResult<()> {
        let bytes = encode_frame(0, 5000, -5000);
        let raw = decode_frame(&bytes)?;
        assert_eq!(raw.position, 1023);
        assert_eq!(raw.force_signed(), -1023);
        Ok(())
    }

    #[test]
    fn test_zero_window_rejected() {
        assert_eq!(decode_frame(&[0; FRAME_LEN]), Err(LinkError::ZeroChecksum));
    }

    #[test]
    fn test_wrong_system_type_rejected() {
        let mut bytes = [0x40, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00];
        let [low, high] = checksum(&bytes[..5]).to_le_bytes();
        bytes[5] = low;
        bytes[6] = high;
        assert_eq!(decode_frame(&bytes), Err(LinkError::SystemType(0x40)));
    }

    #[test]
    fn test_node_type_bits_masked() -> LinkResult<()> {
        let mut bytes = CommandFrame {
            position: 300,
            force: 700,
            ..CommandFrame::idle()
        }
        .encode();
        bytes[2] |= 0xF0;
        bytes[4] |= 0xA8;
        let [low, high] = checksum(&bytes[..5]).to_le_bytes();
        bytes[5] = low;
        bytes[6] = high;
        let raw = decode_frame(&bytes)?;
        assert_eq!(raw.position, 300);
        assert_eq!(raw.force_unsigned(), 700);
        Ok(())
    }

    #[test]
    fn test_feedback_flags_and_signed_force() -> LinkResult<()> {
        let feedback = FeedbackFrame {
            position: -250,
            force: -800,
            activated: true,
            sensor_fault: false,
            temp_limiting: true,
        };
        let raw = decode_frame(&feedback.encode())?;
        assert_eq!(FeedbackFrame::from_raw(&raw), feedback);
        // The same bits read as a command frame.
        let as_command = CommandFrame::from_raw(&raw);
        assert!(as_command.air_in);
        assert!(!as_command.air_out);
        Ok(())
    }

    #[test]
    fn test_window_locks_on_mid_stream() {
        let frame = CommandFrame {
            position: 42,
            ..CommandFrame::idle()
        }
        .encode();
        let mut window = FrameWindow::new();
        let mut decoded = Vec::new();
        for &byte in [0x13, 0x37, 0x00].iter().chain(frame.iter()) {
            if let Ok(raw) = window.push(byte) {
                decoded.push(raw.position);
            }
        }
        assert_eq!(decoded, vec![42]);
        assert_eq!(window.as_bytes(), &frame);
    }
}
