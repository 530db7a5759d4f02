//! Decoder configuration.

use crate::reader::{DEFAULT_CAPACITY, MIN_CAPACITY};

/// Tunables for [`BinaryParser`](crate::BinaryParser).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Size of the read buffer in bytes. Also the largest single scalar
    /// or string chunk the reader can hold at once.
    pub buffer_capacity: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            buffer_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl ParserOptions {
    /// Sets the buffer size, clamped up to the reader's minimum.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(MIN_CAPACITY);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_256_kib() {
        assert_eq!(ParserOptions::default().buffer_capacity, 256 * 1024);
    }

    #[test]
    fn tiny_capacity_is_clamped() {
        assert_eq!(ParserOptions::default().buffer_capacity(3).buffer_capacity, MIN_CAPACITY);
        assert_eq!(ParserOptions::default().buffer_capacity(64).buffer_capacity, 64);
    }
}
