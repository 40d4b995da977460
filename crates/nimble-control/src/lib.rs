//! Tick-driven NimbleStroker controller.
//!
//! Wires the TCode engine to the actuator link. On every tick the controller
//! samples the stroke, vibration, air and force axes, mixes them into a
//! slew-limited command frame, sends it and reads the actuator's feedback.
//!
//! # Overview
//!
//! - **ControlConfig**: tunables with firmware defaults, serde friendly
//! - **TickFlag**: lock-free tick latch between a timer and the loop
//! - **SlewLimiter**: bounded position change per tick
//! - **FrameMixer**: axis samples to command frame
//! - **IndicatorState**: encoder ring and link LED duties
//! - **NimbleController**: run state, axis registration, tick
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use nimble_control::{ControlConfig, NimbleController};
//! use nimble_link::SimulatedActuator;
//! use nimble_tcode::{ManualClock, MemoryCalibrationStore, NullSink};
//!
//! let clock = ManualClock::new(0);
//! let mut controller = NimbleController::new(
//!     ControlConfig::default(),
//!     Arc::new(clock.clone()),
//!     Box::new(NullSink),
//!     Box::new(MemoryCalibrationStore::new()),
//!     SimulatedActuator::default(),
//! )?;
//! controller.init()?;
//! controller.input_line("L09999");
//!
//! clock.advance(200);
//! let report = controller.tick()?;
//! assert_eq!(report.sent.position, 50);
//! assert!(report.link_present);
//! # Ok::<(), nimble_control::ControlError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]

pub mod config;
pub mod controller;
pub mod error;
pub mod indicator;
pub mod mixer;
pub mod slew;
pub mod tick;

pub use config::ControlConfig;
pub use controller::{NimbleController, TickReport};
pub use error::{ControlError, ControlResult};
pub use indicator::{IndicatorState, LED_MAX_DUTY, LINK_LED_DUTY, RingLed, level_display};
pub use mixer::{AirFlow, AxisSamples, FrameMixer, FrameState};
pub use slew::SlewLimiter;
pub use tick::TickFlag;
