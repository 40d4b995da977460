//! TCode error types.
//!
//! Grammar errors never reach the byte-stream caller; the engine logs and
//! drops them. They are surfaced by the typed helpers so tests and hosts can
//! see why a token was rejected.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TCodeError {
    #[error("Channel count {0} outside supported range 1..=10")]
    ChannelCountOutOfRange(usize),

    #[error("Command buffer capacity must be non-zero")]
    ZeroBufferCapacity,

    #[error("Invalid channel id: {0:?}")]
    InvalidChannel(String),

    #[error("Invalid magnitude digits: {0:?}")]
    InvalidMagnitude(String),

    #[error("Invalid extension magnitude digits: {0:?}")]
    InvalidExtension(String),

    #[error("Speed extension requires a non-zero speed")]
    ZeroSpeed,

    #[error("Unexpected trailing input {0:?}")]
    TrailingInput(char),

    #[error("Malformed setup command: {0:?}")]
    MalformedSetup(String),

    #[error("Calibration store error: {0}")]
    Calibration(String),
}

pub type TCodeResult<T> = Result<T, TCodeError>;
