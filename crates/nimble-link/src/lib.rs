//! NimbleStroker serial link protocol.
//!
//! This crate is I/O-free. It provides the 7-byte frame codec, a stateful
//! [`LinkChannel`] per physical link with presence detection, the
//! [`LinkTransport`] port and a [`SimulatedActuator`] peer for hosts without
//! hardware.
//!
//! # Key Features
//! - Sign-and-magnitude position and force encoding
//! - 16-bit additive checksum, all-zero windows rejected
//! - Sliding-window receiver that locks onto frames mid-stream
//! - Presence timeout with idle fallback

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(static_mut_refs)]

pub mod channel;
pub mod error;
pub mod frame;
pub mod sim;
pub mod transport;

pub use channel::{DEFAULT_LINK_TIMEOUT_MS, LinkChannel, LinkRole};
pub use error::{LinkError, LinkResult};
pub use frame::{
    CommandFrame, FRAME_LEN, FeedbackFrame, FrameWindow, IDLE_FORCE, MAX_FORCE, POSITION_MAX,
    RawFrame, checksum, decode_frame, encode_frame,
};
pub use sim::SimulatedActuator;
pub use transport::{LinkTransport, QueueTransport};
