//! Port traits for the outbound text channel.
//!
//! The engine never performs I/O itself. Firmware, version and axis-info
//! replies go through a [`MessageSink`] injected at construction.

use std::sync::Arc;

use parking_lot::Mutex;

/// Receiver of outbound protocol text.
///
/// Each call carries one complete reply including its trailing newline.
pub trait MessageSink: Send {
    fn send(&mut self, message: &str);
}

impl<S: MessageSink + ?Sized> MessageSink for Box<S> {
    fn send(&mut self, message: &str) {
        (**self).send(message);
    }
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn send(&mut self, _message: &str) {}
}

/// Sink that records every message. Clones share the same log, so a test can
/// keep a handle after moving one into the engine.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// All messages concatenated in arrival order.
    pub fn joined(&self) -> String {
        self.messages.lock().concat()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl MessageSink for MessageLog {
    fn send(&mut self, message: &str) {
        self.messages.lock().push(message.to_owned());
    }
}
