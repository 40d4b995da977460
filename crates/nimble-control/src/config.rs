//! Controller configuration.
//!
//! Every field has a default matching the stock firmware, so a partial YAML
//! or JSON document only needs to name what it changes.

use serde::{Deserialize, Serialize};

use nimble_link::{DEFAULT_LINK_TIMEOUT_MS, IDLE_FORCE, MAX_FORCE, POSITION_MAX};
use nimble_tcode::TCodeConfig;
use nimble_tcode::buffer::DEFAULT_COMMAND_BUFFER_CAPACITY;
use nimble_tcode::config::{DEFAULT_FIRMWARE_ID, DEFAULT_TCODE_VERSION};

use crate::error::{ControlError, ControlResult};

/// Largest position change sent to the actuator per tick.
pub const DEFAULT_MAX_POSITION_DELTA: i32 = 50;

/// Peak vibration overlay in actuator position units.
pub const DEFAULT_VIBRATION_MAX_AMPLITUDE: i32 = 25;

pub const DEFAULT_VIBRATION_MAX_SPEED_HZ: f32 = 20.0;

/// Actuator frame period (500 Hz).
pub const DEFAULT_TICK_PERIOD_US: u64 = 2000;

/// Channels per kind needed to address every controller axis (up to `A2`).
pub const MIN_CONTROLLER_CHANNELS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub channel_count: usize,
    pub command_buffer_capacity: usize,
    pub max_position_delta: i32,
    /// Travel bound on either side of centre.
    pub actuator_max_position: i32,
    pub vibration_max_amplitude: i32,
    pub vibration_max_speed_hz: f32,
    /// Force sent while stopped.
    pub idle_force: i32,
    pub max_force: i32,
    pub tick_period_us: u64,
    pub link_timeout_ms: u64,
    /// Stop the controller when the actuator reports thermal limiting.
    pub stop_on_temp_limit: bool,
    pub firmware_id: String,
    pub tcode_version: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            channel_count: 3,
            command_buffer_capacity: DEFAULT_COMMAND_BUFFER_CAPACITY,
            max_position_delta: DEFAULT_MAX_POSITION_DELTA,
            actuator_max_position: POSITION_MAX,
            vibration_max_amplitude: DEFAULT_VIBRATION_MAX_AMPLITUDE,
            vibration_max_speed_hz: DEFAULT_VIBRATION_MAX_SPEED_HZ,
            idle_force: IDLE_FORCE,
            max_force: MAX_FORCE,
            tick_period_us: DEFAULT_TICK_PERIOD_US,
            link_timeout_ms: DEFAULT_LINK_TIMEOUT_MS,
            stop_on_temp_limit: false,
            firmware_id: DEFAULT_FIRMWARE_ID.to_string(),
            tcode_version: DEFAULT_TCODE_VERSION.to_string(),
        }
    }
}

impl ControlConfig {
    pub fn validate(&self) -> ControlResult<()> {
        self.tcode_config().validate()?;

        if self.channel_count < MIN_CONTROLLER_CHANNELS {
            return Err(invalid(format!(
                "channel_count must be at least {MIN_CONTROLLER_CHANNELS}"
            )));
        }
        if self.max_position_delta <= 0 {
            return Err(invalid("max_position_delta must be positive"));
        }
        if !(1..=POSITION_MAX).contains(&self.actuator_max_position) {
            return Err(invalid(format!(
                "actuator_max_position must be within 1..={POSITION_MAX}"
            )));
        }
        if self.vibration_max_amplitude < 0
            || self.vibration_max_amplitude > self.actuator_max_position
        {
            return Err(invalid(
                "vibration_max_amplitude must be within 0..=actuator_max_position",
            ));
        }
        if !self.vibration_max_speed_hz.is_finite() || self.vibration_max_speed_hz < 0.0 {
            return Err(invalid("vibration_max_speed_hz must be a non-negative number"));
        }
        if !(1..=MAX_FORCE).contains(&self.max_force) {
            return Err(invalid(format!("max_force must be within 1..={MAX_FORCE}")));
        }
        if self.idle_force < 0 || self.idle_force > self.max_force {
            return Err(invalid("idle_force must be within 0..=max_force"));
        }
        if self.tick_period_us == 0 {
            return Err(invalid("tick_period_us must be non-zero"));
        }
        if self.link_timeout_ms == 0 {
            return Err(invalid("link_timeout_ms must be non-zero"));
        }
        Ok(())
    }

    /// Parser subset of the configuration.
    pub fn tcode_config(&self) -> TCodeConfig {
        TCodeConfig {
            channel_count: self.channel_count,
            buffer_capacity: self.command_buffer_capacity,
            firmware_id: self.firmware_id.clone(),
            version: self.tcode_version.clone(),
        }
    }
}

fn invalid(message: impl Into<String>) -> ControlError {
    ControlError::InvalidConfig(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimble_tcode::TCodeError;

    #[test]
    fn test_defaults_match_firmware() {
        let config = ControlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_position_delta, 50);
        assert_eq!(config.actuator_max_position, 1000);
        assert_eq!(config.idle_force, 200);
        assert_eq!(config.max_force, 1023);
        assert_eq!(config.tick_period_us, 2000);
        assert_eq!(config.link_timeout_ms, 50);
        assert_eq!(config.tcode_version, "TCode v0.4");
    }

    #[test]
    fn test_partial_document_fills_defaults() -> Result<(), serde_json::Error> {
        let config: ControlConfig =
            serde_json::from_str(r#"{"channel_count": 5, "stop_on_temp_limit": true}"#)?;
        assert_eq!(config.channel_count, 5);
        assert!(config.stop_on_temp_limit);
        assert_eq!(config.command_buffer_capacity, 255);
        assert_eq!(config.firmware_id, DEFAULT_FIRMWARE_ID);
        Ok(())
    }

    #[test]
    fn test_tcode_subset() {
        let config = ControlConfig {
            channel_count: 4,
            firmware_id: "bench".to_string(),
            ..ControlConfig::default()
        };
        let tcode = config.tcode_config();
        assert_eq!(tcode.channel_count, 4);
        assert_eq!(tcode.buffer_capacity, 255);
        assert_eq!(tcode.firmware_id, "bench");
    }

    #[test]
    fn test_rejects_bad_channel_count() {
        let config = ControlConfig {
            channel_count: 11,
            ..ControlConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ControlError::TCode(TCodeError::ChannelCountOutOfRange(11)))
        );
    }

    #[test]
    fn test_rejects_channel_count_below_controller_axes() {
        for channel_count in 1..MIN_CONTROLLER_CHANNELS {
            let config = ControlConfig {
                channel_count,
                ..ControlConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ControlError::InvalidConfig(_))),
                "channel_count {channel_count}"
            );
        }
        let config = ControlConfig {
            channel_count: MIN_CONTROLLER_CHANNELS,
            ..ControlConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let cases = [
            ControlConfig {
                max_position_delta: 0,
                ..ControlConfig::default()
            },
            ControlConfig {
                actuator_max_position: 1001,
                ..ControlConfig::default()
            },
            ControlConfig {
                vibration_max_speed_hz: f32::NAN,
                ..ControlConfig::default()
            },
            ControlConfig {
                idle_force: 1024,
                ..ControlConfig::default()
            },
            ControlConfig {
                tick_period_us: 0,
                ..ControlConfig::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(ControlError::InvalidConfig(_))),
                "{config:?}"
            );
        }
    }
}
