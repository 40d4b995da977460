//! Actuator transports available to the host.

use std::io::Write;

use clap::ValueEnum;
use nimble_link::{FRAME_LEN, LinkError, LinkResult, LinkTransport, SimulatedActuator};

/// How the controller's actuator link is realised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActuatorMode {
    /// Simulated actuator that answers every frame.
    Simulated,
    /// Write outgoing frames as hex lines; nothing ever answers.
    Record,
}

/// Records every outgoing frame as one line of space-separated hex bytes.
/// Never produces inbound bytes, so the link stays absent.
#[derive(Debug)]
pub struct RecordingTransport<W> {
    writer: W,
    pending: Vec<u8>,
}

impl<W: Write + Send> RecordingTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pending: Vec::with_capacity(FRAME_LEN),
        }
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> LinkTransport for RecordingTransport<W> {
    fn read_byte(&mut self) -> LinkResult<Option<u8>> {
        Ok(None)
    }

    fn write_all(&mut self, bytes: &[u8]) -> LinkResult<()> {
        for &byte in bytes {
            self.pending.push(byte);
            if self.pending.len() == FRAME_LEN {
                let line = self
                    .pending
                    .iter()
                    .map(|b| format!("{b:02X}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(self.writer, "{line}")?;
                self.pending.clear();
            }
        }
        self.writer.flush().map_err(LinkError::from)
    }
}

/// Either transport behind one type, so the controller stays monomorphic.
#[derive(Debug)]
pub enum HostTransport<W> {
    Simulated(SimulatedActuator),
    Record(RecordingTransport<W>),
}

impl<W: Write + Send> LinkTransport for HostTransport<W> {
    fn read_byte(&mut self) -> LinkResult<Option<u8>> {
        match self {
            HostTransport::Simulated(sim) => sim.read_byte(),
            HostTransport::Record(rec) => rec.read_byte(),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> LinkResult<()> {
        match self {
            HostTransport::Simulated(sim) => sim.write_all(bytes),
            HostTransport::Record(rec) => rec.write_all(bytes),
        }
    }
}
