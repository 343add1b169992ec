//! Frame codec for the 24-byte-header binary protocol.

use bytes::{Bytes, BytesMut};
use mcbp_protocol::{HEADER_LEN, OperationHeader};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;

/// Default maximum frame size: a 20 MiB document plus framing overhead.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 20 * 1024 * 1024 + 64 * 1024;

/// A complete frame as read from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Decoded header.
    pub header: OperationHeader,
    /// The whole frame, header included.
    pub raw: Bytes,
}

impl Frame {
    /// Correlation id of the frame.
    #[must_use]
    pub fn opaque(&self) -> u32 {
        self.header.opaque
    }

    /// Total frame length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the frame is empty. A decoded frame never is.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Reassembles frames across TCP segment boundaries using the header's
/// total body length.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    /// Create a codec with the default maximum frame size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Set the maximum frame size, header included.
    #[must_use]
    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max.max(HEADER_LEN);
        self
    }

    /// Maximum frame size.
    #[must_use]
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_LEN {
            src.reserve(HEADER_LEN - src.len());
            return Ok(None);
        }

        let header = OperationHeader::parse(&src[..])?;
        let frame_len = header.frame_length();
        if frame_len > self.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                size: frame_len,
                max: self.max_frame_size,
            });
        }
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        let raw = src.split_to(frame_len).freeze();
        tracing::trace!(
            opcode = header.opcode,
            opaque = header.opaque,
            length = frame_len,
            "decoded frame"
        );
        Ok(Some(Frame { header, raw }))
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                size: item.len(),
                max: self.max_frame_size,
            });
        }
        tracing::trace!(length = item.len(), "encoding frame");
        dst.extend_from_slice(&item);
        Ok(())
    }
}
