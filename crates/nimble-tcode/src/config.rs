//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::buffer::DEFAULT_COMMAND_BUFFER_CAPACITY;
use crate::channel::MAX_CHANNEL_COUNT;
use crate::error::{TCodeError, TCodeResult};

/// Firmware id reported by `D0` unless configured otherwise.
pub const DEFAULT_FIRMWARE_ID: &str = "NimbleStroker_TCode_Serial_POC";

/// Protocol version reported by `D1`.
pub const DEFAULT_TCODE_VERSION: &str = "TCode v0.4";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TCodeConfig {
    /// Channels addressable per kind, `1..=10`.
    pub channel_count: usize,
    pub buffer_capacity: usize,
    pub firmware_id: String,
    pub version: String,
}

impl Default for TCodeConfig {
    fn default() -> Self {
        Self {
            channel_count: 3,
            buffer_capacity: DEFAULT_COMMAND_BUFFER_CAPACITY,
            firmware_id: DEFAULT_FIRMWARE_ID.to_string(),
            version: DEFAULT_TCODE_VERSION.to_string(),
        }
    }
}

impl TCodeConfig {
    pub fn with_channel_count(mut self, channel_count: usize) -> Self {
        self.channel_count = channel_count;
        self
    }

    pub fn with_firmware_id(mut self, firmware_id: impl Into<String>) -> Self {
        self.firmware_id = firmware_id.into();
        self
    }

    pub fn validate(&self) -> TCodeResult<()> {
        if self.channel_count == 0 || self.channel_count > MAX_CHANNEL_COUNT {
            return Err(TCodeError::ChannelCountOutOfRange(self.channel_count));
        }
        if self.buffer_capacity == 0 {
            return Err(TCodeError::ZeroBufferCapacity);
        }
        Ok(())
    }
}
