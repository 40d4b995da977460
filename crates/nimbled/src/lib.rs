//! Host runner for the NimbleStroker TCode controller.
//!
//! Reads TCode from standard input, runs the controller tick loop on the
//! host clock and talks to a simulated actuator or records the frames it
//! would have sent.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod input;
pub mod runner;
pub mod sink;
pub mod store;
pub mod transport;

pub use config::{load_config, parse_config, save_config};
pub use error::DaemonError;
pub use input::{HostCommand, InputEvent};
pub use runner::{RunOptions, RunSummary, Ticker};
pub use store::{FileByteStore, open_calibration};
pub use transport::{ActuatorMode, HostTransport, RecordingTransport};
