//! Fixed-capacity FIFO of command characters.
//!
//! The buffer is the backpressure point of the byte stream: a failed
//! [`CommandBuffer::push`] tells the engine to execute the oldest buffered
//! token before retrying.
//!
//! # RT Safety
//!
//! - Storage is allocated once at construction
//! - O(1) push, pop and peek
//! - No growth, ever

use std::collections::VecDeque;

use crate::error::{TCodeError, TCodeResult};

/// Default buffer length used by the firmware.
pub const DEFAULT_COMMAND_BUFFER_CAPACITY: usize = 255;

/// FIFO of upper-cased command bytes.
#[derive(Debug, Clone)]
pub struct CommandBuffer {
    bytes: VecDeque<u8>,
    capacity: usize,
}

impl CommandBuffer {
    /// Create a buffer holding at most `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> TCodeResult<Self> {
        if capacity == 0 {
            return Err(TCodeError::ZeroBufferCapacity);
        }
        Ok(Self {
            bytes: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.bytes.len() >= self.capacity
    }

    /// Append a byte at the tail. Returns `false` and leaves the buffer
    /// untouched when it is full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.bytes.push_back(byte);
        true
    }

    /// Remove and return the byte at the head.
    pub fn pop(&mut self) -> Option<u8> {
        self.bytes.pop_front()
    }

    /// Return the byte at the head without removing it.
    pub fn peek(&self) -> Option<u8> {
        self.bytes.front().copied()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self {
            bytes: VecDeque::with_capacity(DEFAULT_COMMAND_BUFFER_CAPACITY),
            capacity: DEFAULT_COMMAND_BUFFER_CAPACITY,
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_len_never_exceeds_capacity(
            capacity in 1usize..64,
            bytes in proptest::collection::vec(any::<u8>(), 0..200),
        ) {
            let mut buffer = CommandBuffer::with_capacity(capacity).map_err(|e| TestCaseError::fail(e.to_string()))?;
            for byte in bytes {
                buffer.push(byte);
                prop_assert!(buffer.len() <= capacity);
            }
        }

        #[test]
        fn prop_pops_in_push_order(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let mut buffer = CommandBuffer::with_capacity(64).map_err(|e| TestCaseError::fail(e.to_string()))?;
            for &byte in &bytes {
                prop_assert!(buffer.push(byte));
            }
            let drained: Vec<u8> = std::iter::from_fn(|| buffer.pop()).collect();
            prop_assert_eq!(drained, bytes);
        }
    }
}
