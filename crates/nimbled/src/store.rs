//! File-backed calibration memory.
//!
//! The whole image is held in memory and rewritten on every commit, the way
//! an EEPROM emulation flushes its page.

use std::path::{Path, PathBuf};

use nimble_tcode::{ByteCalibrationStore, ByteStore, MemoryByteStore, TCodeError, TCodeResult};
use tracing::debug;

use crate::error::DaemonError;

#[derive(Debug)]
pub struct FileByteStore {
    path: PathBuf,
    memory: MemoryByteStore,
}

impl FileByteStore {
    /// Open `path`, or start from erased memory of `len` bytes when it does
    /// not exist yet. An existing file must be exactly `len` bytes.
    pub fn open(path: impl Into<PathBuf>, len: usize) -> Result<Self, DaemonError> {
        let path = path.into();
        let memory = match std::fs::read(&path) {
            Ok(bytes) if bytes.len() == len => MemoryByteStore::from_bytes(bytes),
            Ok(bytes) => {
                return Err(DaemonError::CalibrationSize {
                    path: path.display().to_string(),
                    actual: bytes.len(),
                    expected: len,
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Calibration file {:?} not found, starting erased", path);
                MemoryByteStore::new(len)
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, memory })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteStore for FileByteStore {
    fn len(&self) -> usize {
        self.memory.len()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> TCodeResult<()> {
        self.memory.read(offset, buf)
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> TCodeResult<()> {
        self.memory.write(offset, data)
    }

    fn commit(&mut self) -> TCodeResult<()> {
        std::fs::write(&self.path, self.memory.as_bytes()).map_err(|e| {
            TCodeError::Calibration(format!("failed to write {:?}: {e}", self.path))
        })
    }
}

/// Calibration store persisted at `path` for `channel_count` channels.
pub fn open_calibration(
    path: impl Into<PathBuf>,
    channel_count: usize,
) -> Result<ByteCalibrationStore<FileByteStore>, DaemonError> {
    let len = ByteCalibrationStore::<FileByteStore>::required_len(channel_count);
    let file = FileByteStore::open(path, len)?;
    ByteCalibrationStore::new(file, channel_count)
        .map_err(|e| DaemonError::InvalidConfiguration(e.to_string()))
}
