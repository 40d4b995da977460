//! Controller error types.

use nimble_link::LinkError;
use nimble_tcode::TCodeError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("TCode engine error: {0}")]
    TCode(#[from] TCodeError),

    #[error("Actuator link error: {0}")]
    Link(#[from] LinkError),
}

pub type ControlResult<T> = Result<T, ControlError>;
