//! Persisted per-axis range limits.
//!
//! The engine only reads ranges for the `D2` info rows and writes them from
//! `$` setup commands; motion never consults them.
//!
//! [`ByteCalibrationStore`] keeps the firmware's byte layout so images can be
//! moved between a device and a host:
//!
//! ```text
//! offset 0      "TCODE" (5 bytes)
//! offset 5      for kind in L, R, V, A:
//!                   for index in 0..channel_count:
//!                       low  (i32 LE)
//!                       high (i32 LE)
//! ```

use crate::axis::{AXIS_MAX, AXIS_MIN};
use crate::channel::{CHANNEL_KIND_COUNT, ChannelId, MAX_CHANNEL_COUNT};
use crate::error::{TCodeError, TCodeResult};

/// Magic key written at the start of an initialised store.
pub const MEMORY_KEY: &[u8; 5] = b"TCODE";

const ENTRY_LEN: usize = 8;

/// Range every axis receives when a store is formatted.
pub const DEFAULT_RANGE: (i32, i32) = (AXIS_MIN, AXIS_MAX);

/// Persistent low/high bounds per channel.
pub trait CalibrationStore: Send {
    /// Prepare the store. Formats it (key plus default ranges) when the key
    /// is missing and returns `true` in that case.
    fn initialise(&mut self) -> TCodeResult<bool>;

    fn get_range(&self, id: ChannelId) -> TCodeResult<(i32, i32)>;

    fn put_range(&mut self, id: ChannelId, low: i32, high: i32) -> TCodeResult<()>;
}

impl<S: CalibrationStore + ?Sized> CalibrationStore for Box<S> {
    fn initialise(&mut self) -> TCodeResult<bool> {
        (**self).initialise()
    }

    fn get_range(&self, id: ChannelId) -> TCodeResult<(i32, i32)> {
        (**self).get_range(id)
    }

    fn put_range(&mut self, id: ChannelId, low: i32, high: i32) -> TCodeResult<()> {
        (**self).put_range(id, low, high)
    }
}

/// In-memory store, formatted on first initialisation.
#[derive(Debug, Clone)]
pub struct MemoryCalibrationStore {
    ranges: [[(i32, i32); MAX_CHANNEL_COUNT]; CHANNEL_KIND_COUNT],
    initialised: bool,
}

impl Default for MemoryCalibrationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCalibrationStore {
    pub fn new() -> Self {
        Self {
            ranges: [[DEFAULT_RANGE; MAX_CHANNEL_COUNT]; CHANNEL_KIND_COUNT],
            initialised: false,
        }
    }
}

impl CalibrationStore for MemoryCalibrationStore {
    fn initialise(&mut self) -> TCodeResult<bool> {
        if self.initialised {
            return Ok(false);
        }
        self.ranges = [[DEFAULT_RANGE; MAX_CHANNEL_COUNT]; CHANNEL_KIND_COUNT];
        self.initialised = true;
        Ok(true)
    }

    fn get_range(&self, id: ChannelId) -> TCodeResult<(i32, i32)> {
        self.ranges
            .get(id.kind().slot())
            .and_then(|row| row.get(id.index()))
            .copied()
            .ok_or_else(|| TCodeError::InvalidChannel(id.to_string()))
    }

    fn put_range(&mut self, id: ChannelId, low: i32, high: i32) -> TCodeResult<()> {
        let slot = self
            .ranges
            .get_mut(id.kind().slot())
            .and_then(|row| row.get_mut(id.index()))
            .ok_or_else(|| TCodeError::InvalidChannel(id.to_string()))?;
        *slot = (low.clamp(AXIS_MIN, AXIS_MAX), high.clamp(AXIS_MIN, AXIS_MAX));
        Ok(())
    }
}

/// Raw byte-addressed persistent memory (EEPROM, flash page, file).
pub trait ByteStore: Send {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> TCodeResult<()>;

    fn write(&mut self, offset: usize, data: &[u8]) -> TCodeResult<()>;

    /// Flush pending writes to the backing medium.
    fn commit(&mut self) -> TCodeResult<()> {
        Ok(())
    }
}

/// Fixed-size byte store in RAM. Fresh memory reads as `0xFF`, like erased
/// EEPROM.
#[derive(Debug, Clone)]
pub struct MemoryByteStore {
    bytes: Vec<u8>,
}

impl MemoryByteStore {
    pub fn new(len: usize) -> Self {
        Self {
            bytes: vec![0xFF; len],
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl ByteStore for MemoryByteStore {
    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> TCodeResult<()> {
        let src = offset
            .checked_add(buf.len())
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or_else(|| out_of_bounds(offset, buf.len(), self.bytes.len()))?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> TCodeResult<()> {
        let len = self.bytes.len();
        let dst = offset
            .checked_add(data.len())
            .and_then(|end| self.bytes.get_mut(offset..end))
            .ok_or_else(|| out_of_bounds(offset, data.len(), len))?;
        dst.copy_from_slice(data);
        Ok(())
    }
}

fn out_of_bounds(offset: usize, len: usize, capacity: usize) -> TCodeError {
    TCodeError::Calibration(format!(
        "access of {len} bytes at offset {offset} exceeds store size {capacity}"
    ))
}

/// [`CalibrationStore`] over a [`ByteStore`] in the firmware layout.
#[derive(Debug, Clone)]
pub struct ByteCalibrationStore<B> {
    bytes: B,
    channel_count: usize,
}

impl<B: ByteStore> ByteCalibrationStore<B> {
    /// Bytes needed to hold the key and every range for `channel_count`.
    pub fn required_len(channel_count: usize) -> usize {
        MEMORY_KEY.len() + CHANNEL_KIND_COUNT * channel_count * ENTRY_LEN
    }

    pub fn new(bytes: B, channel_count: usize) -> TCodeResult<Self> {
        if channel_count == 0 || channel_count > MAX_CHANNEL_COUNT {
            return Err(TCodeError::ChannelCountOutOfRange(channel_count));
        }
        let required = Self::required_len(channel_count);
        if bytes.len() < required {
            return Err(TCodeError::Calibration(format!(
                "store holds {} bytes, layout needs {required}",
                bytes.len()
            )));
        }
        Ok(Self {
            bytes,
            channel_count,
        })
    }

    pub fn into_inner(self) -> B {
        self.bytes
    }

    pub fn inner(&self) -> &B {
        &self.bytes
    }

    fn has_key(&self) -> TCodeResult<bool> {
        let mut key = [0u8; 5];
        self.bytes.read(0, &mut key)?;
        Ok(&key == MEMORY_KEY)
    }

    fn entry_offset(&self, slot: usize, index: usize) -> usize {
        MEMORY_KEY.len() + (slot * self.channel_count + index) * ENTRY_LEN
    }

    fn offset_of(&self, id: ChannelId) -> TCodeResult<usize> {
        if id.index() >= self.channel_count {
            return Err(TCodeError::InvalidChannel(id.to_string()));
        }
        Ok(self.entry_offset(id.kind().slot(), id.index()))
    }

    fn write_entry(&mut self, offset: usize, low: i32, high: i32) -> TCodeResult<()> {
        let mut entry = [0u8; ENTRY_LEN];
        entry[..4].copy_from_slice(&low.to_le_bytes());
        entry[4..].copy_from_slice(&high.to_le_bytes());
        self.bytes.write(offset, &entry)
    }
}

impl<B: ByteStore> CalibrationStore for ByteCalibrationStore<B> {
    fn initialise(&mut self) -> TCodeResult<bool> {
        if self.has_key()? {
            return Ok(false);
        }
        self.bytes.write(0, MEMORY_KEY)?;
        for slot in 0..CHANNEL_KIND_COUNT {
            for index in 0..self.channel_count {
                let offset = self.entry_offset(slot, index);
                self.write_entry(offset, DEFAULT_RANGE.0, DEFAULT_RANGE.1)?;
            }
        }
        self.bytes.commit()?;
        Ok(true)
    }

    fn get_range(&self, id: ChannelId) -> TCodeResult<(i32, i32)> {
        let offset = self.offset_of(id)?;
        let mut entry = [0u8; ENTRY_LEN];
        self.bytes.read(offset, &mut entry)?;
        let low = i32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]);
        let high = i32::from_le_bytes([entry[4], entry[5], entry[6], entry[7]]);
        Ok((low, high))
    }

    fn put_range(&mut self, id: ChannelId, low: i32, high: i32) -> TCodeResult<()> {
        let offset = self.offset_of(id)?;
        self.write_entry(
            offset,
            low.clamp(AXIS_MIN, AXIS_MAX),
            high.clamp(AXIS_MIN, AXIS_MAX),
        )?;
        self.bytes.commit()
    }
}
