//! Protocol-level error types.

use thiserror::Error;

/// Errors that can occur while encoding or decoding protocol frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Frame data is truncated or incomplete.
    #[error("incomplete frame: expected {expected} bytes, got {actual}")]
    IncompleteFrame {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes available.
        actual: usize,
    },

    /// Destination buffer is too small for the value being written.
    #[error("buffer overflow: needed {needed} bytes, capacity {capacity}")]
    BufferOverflow {
        /// Bytes needed.
        needed: usize,
        /// Buffer capacity.
        capacity: usize,
    },

    /// Invalid magic byte at the start of a frame.
    #[error("invalid magic: {0:#x}")]
    InvalidMagic(u8),

    /// Timestamp outside the representable range.
    #[error("invalid timestamp: {0} ms")]
    InvalidTimestamp(i64),

    /// String encoding error.
    #[error("string encoding error: {0}")]
    StringEncoding(String),

    /// The operation requires a key but none was set.
    #[error("operation {opcode:#04x} requires a key")]
    MissingKey {
        /// Opcode of the operation.
        opcode: u8,
    },

    /// The operation requires a vbucket id but none was set.
    #[error("operation {opcode:#04x} requires a vbucket id")]
    MissingVBucket {
        /// Opcode of the operation.
        opcode: u8,
    },

    /// A variable-length segment does not fit its length field.
    #[error("{segment} too long: {length} bytes (max {max})")]
    SegmentTooLong {
        /// Segment name.
        segment: &'static str,
        /// Actual length.
        length: usize,
        /// Maximum length representable in the header.
        max: usize,
    },

    /// No response has been assigned to the operation yet.
    #[error("no response received")]
    ResponseNotReceived,
}
