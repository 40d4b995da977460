//! Link error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Checksum mismatch: expected {expected:#06x}, got {actual:#06x}")]
    ChecksumMismatch { expected: u16, actual: u16 },

    #[error("All-zero checksum")]
    ZeroChecksum,

    #[error("Unexpected system type in status byte {0:#04x}")]
    SystemType(u8),

    #[error("Transport error: {0}")]
    Transport(String),
}

pub type LinkResult<T> = Result<T, LinkError>;

impl From<std::io::Error> for LinkError {
    fn from(e: std::io::Error) -> Self {
        LinkError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LinkError::ChecksumMismatch {
            expected: 0x016F,
            actual: 0x016E,
        };
        assert_eq!(
            err.to_string(),
            "Checksum mismatch: expected 0x016f, got 0x016e"
        );
        assert_eq!(
            LinkError::SystemType(0x44).to_string(),
            "Unexpected system type in status byte 0x44"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "port closed");
        let err: LinkError = io_err.into();
        assert!(matches!(err, LinkError::Transport(_)));
    }
}
