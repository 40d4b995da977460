//! Protocol replies to a writer.

use std::io::Write;

use nimble_tcode::MessageSink;
use tracing::warn;

/// Writes every reply to `W` and flushes, so a peer reading the pipe sees
/// it immediately.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Replies go to standard output.
pub fn stdout_sink() -> WriterSink<std::io::Stdout> {
    WriterSink::new(std::io::stdout())
}

impl<W: Write + Send> MessageSink for WriterSink<W> {
    fn send(&mut self, message: &str) {
        let result = self
            .writer
            .write_all(message.as_bytes())
            .and_then(|()| self.writer.flush());
        if let Err(e) = result {
            warn!(error = %e, "Failed to write reply");
        }
    }
}
