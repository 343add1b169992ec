//! Codec error types.

use thiserror::Error;

/// Errors that can occur while framing or exchanging frames.
#[derive(Debug, Error)]
pub enum CodecError {
    /// IO error during read/write operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol-level error from mcbp-protocol.
    #[error("protocol error: {0}")]
    Protocol(#[from] mcbp_protocol::ProtocolError),

    /// Frame exceeds the configured maximum.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Declared frame size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Connection closed before a response arrived.
    #[error("connection closed")]
    ConnectionClosed,

    /// A response did not carry the opaque of the request it answered.
    #[error("opaque mismatch: expected {expected:#x}, got {actual:#x}")]
    OpaqueMismatch {
        /// Opaque of the request.
        expected: u32,
        /// Opaque of the response.
        actual: u32,
    },
}
