//! TCode command protocol engine.
//!
//! This crate turns a stream of ASCII TCode commands into time-interpolated
//! axis positions.
//!
//! # Overview
//!
//! - **CommandBuffer**: fixed-capacity FIFO that absorbs the byte stream
//! - **Command**: token grammar for axis, device and setup commands
//! - **TCode**: tokenizer, dispatcher and registry of every axis
//! - **Axis**: ramp state with adaptive smoothing and easing
//! - **Easing**: float and Q16.16 fixed-point ramp shaping
//! - **Calibration**: persisted per-axis ranges for `D2` and `$` commands
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use nimble_tcode::prelude::*;
//!
//! let clock = ManualClock::new(0);
//! let log = MessageLog::new();
//! let mut tcode = TCode::new(
//!     TCodeConfig::default(),
//!     Arc::new(clock.clone()),
//!     Box::new(log.clone()),
//!     Box::new(MemoryCalibrationStore::new()),
//! )?;
//!
//! tcode.input_line("L09999I1000 D1");
//! clock.advance(500);
//! assert_eq!(tcode.axis_read("L0"), 7499);
//! assert_eq!(log.joined(), "TCode v0.4\n");
//! # Ok::<(), nimble_tcode::TCodeError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]

pub mod axis;
pub mod buffer;
pub mod calibration;
pub mod channel;
pub mod clock;
pub mod command;
pub mod config;
pub mod easing;
pub mod error;
pub mod fixed;
pub mod ports;
pub mod tcode;

pub use axis::{AXIS_DEFAULT_VALUE, AXIS_MAX, AXIS_MIN, Axis, Ramp, RampExtension};
pub use buffer::CommandBuffer;
pub use calibration::{
    ByteCalibrationStore, ByteStore, CalibrationStore, MemoryByteStore, MemoryCalibrationStore,
};
pub use channel::{ChannelId, ChannelKind, MAX_CHANNEL_COUNT};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use command::{AxisCommand, Command, DeviceCommand, SetupCommand};
pub use config::TCodeConfig;
pub use easing::{DefaultEasing, EasingMath, EasingType, FixedEasing, FloatEasing};
pub use error::{TCodeError, TCodeResult};
pub use fixed::Q16;
pub use ports::{MessageLog, MessageSink, NullSink};
pub use tcode::TCode;

/// Common imports for hosts embedding the engine.
pub mod prelude {
    pub use crate::axis::{Axis, RampExtension};
    pub use crate::calibration::{CalibrationStore, MemoryCalibrationStore};
    pub use crate::channel::{ChannelId, ChannelKind};
    pub use crate::clock::{Clock, ManualClock, MonotonicClock};
    pub use crate::config::TCodeConfig;
    pub use crate::easing::EasingType;
    pub use crate::error::{TCodeError, TCodeResult};
    pub use crate::ports::{MessageLog, MessageSink, NullSink};
    pub use crate::tcode::TCode;
}
