//! Byte transport port.
//!
//! The link never opens ports or configures baud rates. A transport hands
//! over whatever bytes are already buffered and accepts whole frames.

use std::collections::VecDeque;

use crate::error::LinkResult;

pub trait LinkTransport: Send {
    /// Next buffered byte, or `None` when nothing is waiting. Must not block.
    fn read_byte(&mut self) -> LinkResult<Option<u8>>;

    fn write_all(&mut self, bytes: &[u8]) -> LinkResult<()>;
}

impl<T: LinkTransport + ?Sized> LinkTransport for Box<T> {
    fn read_byte(&mut self) -> LinkResult<Option<u8>> {
        (**self).read_byte()
    }

    fn write_all(&mut self, bytes: &[u8]) -> LinkResult<()> {
        (**self).write_all(bytes)
    }
}

/// In-memory transport: bytes pushed inbound are read back, written bytes
/// accumulate for inspection.
#[derive(Debug, Clone, Default)]
pub struct QueueTransport {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
}

impl QueueTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    pub fn take_outbound(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbound)
    }

    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }
}

impl LinkTransport for QueueTransport {
    fn read_byte(&mut self) -> LinkResult<Option<u8>> {
        Ok(self.inbound.pop_front())
    }

    fn write_all(&mut self, bytes: &[u8]) -> LinkResult<()> {
        self.outbound.extend_from_slice(bytes);
        Ok(())
    }
}
