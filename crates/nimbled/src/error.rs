//! Error types for the host runner

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Calibration file {path} is {actual} bytes, expected {expected}")]
    CalibrationSize {
        path: String,
        actual: usize,
        expected: usize,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Controller error: {0}")]
    Control(#[from] nimble_control::ControlError),
}
