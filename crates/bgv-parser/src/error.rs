//! Error types for bgv-parser.
//!
//! [`ParseError`] covers every fatal condition of a decode: channel
//! failures, the stream ending inside a record, corrupt pool references,
//! unbalanced groups and tag bytes outside their enumeration. There is no
//! partial-result recovery; any of these aborts the whole parse.

use std::fmt;

use bgv_model::{ModelError, NodeId};
use thiserror::Error;

use crate::pool::PoolKind;

/// Convenience alias used throughout the parser.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Which enumeration a tag byte was read for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagContext {
    TopLevel,
    PoolReference,
    PoolEntryKind,
    ClassSubtype,
    PropertyValue,
    ArrayElement,
}

impl fmt::Display for TagContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagContext::TopLevel => "top-level record",
            TagContext::PoolReference => "pool reference",
            TagContext::PoolEntryKind => "pool entry kind",
            TagContext::ClassSubtype => "class subtype",
            TagContext::PropertyValue => "property value",
            TagContext::ArrayElement => "array element",
        };
        f.write_str(name)
    }
}

/// Errors produced while decoding a binary graph stream.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The underlying channel failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel was exhausted before a record was complete.
    #[error("unexpected end of stream: needed {needed} bytes, {available} available")]
    EndOfStream { needed: usize, available: usize },

    /// A single decode asked for more contiguous bytes than the buffer
    /// holds. This is a caller bug, not bad input.
    #[error("requested {requested} contiguous bytes but buffer capacity is {capacity}")]
    ExceedsCapacity { requested: usize, capacity: usize },

    /// A pool back-reference pointed past the end of the pool.
    #[error("invalid constant pool index {index} (pool size {len})")]
    InvalidPoolIndex { index: u16, len: usize },

    /// A close-group record arrived with no group open.
    #[error("close-group record without a matching open group")]
    UnbalancedGroups,

    /// A tag byte was outside the values allowed at its position.
    #[error("unknown {context} tag 0x{tag:02x}")]
    UnknownTag { context: TagContext, tag: u8 },

    /// A pool reference resolved to an entry of the wrong kind.
    #[error("expected {expected} pool entry, found {found}")]
    PoolKindMismatch { expected: PoolKind, found: PoolKind },

    /// A node record referenced a null node class.
    #[error("node {node} has no node class")]
    MissingNodeClass { node: NodeId },

    /// The document model rejected a mutation.
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl ParseError {
    /// Returns `true` if the channel ran dry. At a record boundary this is
    /// the normal way a stream ends.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ParseError::EndOfStream { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_message_names_context() {
        let err = ParseError::UnknownTag {
            context: TagContext::PropertyValue,
            tag: 0x2a,
        };
        assert_eq!(err.to_string(), "unknown property value tag 0x2a");
    }

    #[test]
    fn end_of_stream_is_distinct_from_capacity() {
        let eos = ParseError::EndOfStream {
            needed: 4,
            available: 1,
        };
        let cap = ParseError::ExceedsCapacity {
            requested: 64,
            capacity: 16,
        };
        assert!(eos.is_end_of_stream());
        assert!(!cap.is_end_of_stream());
    }
}
