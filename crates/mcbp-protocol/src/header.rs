//! Frame header definitions.
//!
//! Every frame starts with a fixed 24-byte header:
//!
//! ```text
//! offset  size  request            response
//! 0       1     magic (0x80)       magic (0x81)
//! 1       1     opcode             opcode
//! 2       2     key length         key length
//! 4       1     extras length      extras length
//! 5       1     datatype           datatype
//! 6       2     vbucket id         status
//! 8       4     total body length  total body length
//! 12      4     opaque             opaque
//! 16      8     CAS                CAS
//! ```
//!
//! The total body length covers extras, key, path and value together.

use crate::converter::ByteConverter;
use crate::error::ProtocolError;

/// Length of the fixed frame header.
pub const HEADER_LEN: usize = 24;

/// Byte offsets of the header fields.
pub mod offsets {
    /// Magic byte.
    pub const MAGIC: usize = 0;
    /// Opcode.
    pub const OPCODE: usize = 1;
    /// Key length (2 bytes).
    pub const KEY_LENGTH: usize = 2;
    /// Extras length.
    pub const EXTRAS_LENGTH: usize = 4;
    /// Datatype.
    pub const DATATYPE: usize = 5;
    /// VBucket id in requests (2 bytes).
    pub const VBUCKET: usize = 6;
    /// Status in responses (2 bytes).
    pub const STATUS: usize = 6;
    /// Total body length (4 bytes).
    pub const BODY_LENGTH: usize = 8;
    /// Opaque (4 bytes).
    pub const OPAQUE: usize = 12;
    /// CAS (8 bytes).
    pub const CAS: usize = 16;
}

/// Frame direction marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Magic {
    /// Client to server.
    Request = 0x80,
    /// Server to client.
    Response = 0x81,
}

impl Magic {
    /// Create from raw byte value.
    pub fn from_u8(value: u8) -> Result<Self, ProtocolError> {
        match value {
            0x80 => Ok(Self::Request),
            0x81 => Ok(Self::Response),
            _ => Err(ProtocolError::InvalidMagic(value)),
        }
    }
}

/// Operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Fetch a document.
    Get = 0x00,
    /// Store a document unconditionally.
    Set = 0x01,
    /// Store a document if it does not exist.
    Add = 0x02,
    /// Store a document if it exists.
    Replace = 0x03,
    /// Remove a document.
    Delete = 0x04,
    /// Increment a counter.
    Increment = 0x05,
    /// Decrement a counter.
    Decrement = 0x06,
    /// No-op, used as a keep-alive.
    Noop = 0x0a,
    /// Feature negotiation.
    Hello = 0x1f,
    /// Sequence-number observation.
    ObserveSeqno = 0x91,
    /// Classic persistence/replication observation.
    Observe = 0x92,
    /// Sub-document get.
    SubGet = 0xc5,
    /// Sub-document path existence check.
    SubExist = 0xc6,
    /// Sub-document dictionary add.
    SubDictAdd = 0xc7,
    /// Sub-document dictionary upsert.
    SubDictUpsert = 0xc8,
    /// Sub-document delete.
    SubDelete = 0xc9,
    /// Sub-document replace.
    SubReplace = 0xca,
    /// Sub-document array append.
    SubArrayPushLast = 0xcb,
    /// Sub-document array prepend.
    SubArrayPushFirst = 0xcc,
    /// Sub-document array insert.
    SubArrayInsert = 0xcd,
    /// Sub-document array add-unique.
    SubArrayAddUnique = 0xce,
    /// Sub-document counter.
    SubCounter = 0xcf,
    /// Sub-document element count.
    SubGetCount = 0xd2,
}

impl OpCode {
    /// Create an opcode from a raw byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Get),
            0x01 => Some(Self::Set),
            0x02 => Some(Self::Add),
            0x03 => Some(Self::Replace),
            0x04 => Some(Self::Delete),
            0x05 => Some(Self::Increment),
            0x06 => Some(Self::Decrement),
            0x0a => Some(Self::Noop),
            0x1f => Some(Self::Hello),
            0x91 => Some(Self::ObserveSeqno),
            0x92 => Some(Self::Observe),
            0xc5 => Some(Self::SubGet),
            0xc6 => Some(Self::SubExist),
            0xc7 => Some(Self::SubDictAdd),
            0xc8 => Some(Self::SubDictUpsert),
            0xc9 => Some(Self::SubDelete),
            0xca => Some(Self::SubReplace),
            0xcb => Some(Self::SubArrayPushLast),
            0xcc => Some(Self::SubArrayPushFirst),
            0xcd => Some(Self::SubArrayInsert),
            0xce => Some(Self::SubArrayAddUnique),
            0xcf => Some(Self::SubCounter),
            0xd2 => Some(Self::SubGetCount),
            _ => None,
        }
    }

    /// Whether the opcode reads a path within a document.
    #[must_use]
    pub const fn is_subdoc_lookup(&self) -> bool {
        matches!(self, Self::SubGet | Self::SubExist | Self::SubGetCount)
    }

    /// Whether the opcode writes a path within a document.
    #[must_use]
    pub const fn is_subdoc_mutation(&self) -> bool {
        matches!(
            self,
            Self::SubDictAdd
                | Self::SubDictUpsert
                | Self::SubDelete
                | Self::SubReplace
                | Self::SubArrayPushLast
                | Self::SubArrayPushFirst
                | Self::SubArrayInsert
                | Self::SubArrayAddUnique
                | Self::SubCounter
        )
    }
}

/// Datatype flags carried in header byte 5.
pub mod datatype {
    /// Raw bytes.
    pub const RAW: u8 = 0x00;
    /// Value is JSON.
    pub const JSON: u8 = 0x01;
    /// Value is snappy-compressed.
    pub const SNAPPY: u8 = 0x02;
    /// Value carries extended attributes.
    pub const XATTR: u8 = 0x04;
}

/// Response status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseStatus {
    /// Operation succeeded.
    #[default]
    Success,
    /// Key does not exist.
    KeyNotFound,
    /// Key exists (CAS mismatch or add on existing key).
    KeyExists,
    /// Value exceeds the server limit.
    ValueTooLarge,
    /// Invalid arguments.
    InvalidArguments,
    /// Item not stored.
    ItemNotStored,
    /// Increment/decrement on a non-numeric value.
    IncrDecrOnNonNumeric,
    /// VBucket is not owned by this node.
    VBucketBelongsToAnotherServer,
    /// Authentication failed.
    AuthenticationError,
    /// Unknown command.
    UnknownCommand,
    /// Server is out of memory.
    OutOfMemory,
    /// Command not supported.
    NotSupported,
    /// Internal server error.
    InternalError,
    /// Server busy.
    Busy,
    /// Temporary failure, retry later.
    TemporaryFailure,
    /// Sub-document path does not exist.
    SubDocPathNotFound,
    /// Sub-document path conflicts with the document structure.
    SubDocPathMismatch,
    /// Sub-document path already exists.
    SubDocPathExists,
    /// Any other server status.
    Other(u16),
    /// The response could not be decoded on the client.
    ClientFailure,
}

impl ResponseStatus {
    /// Map a wire status code.
    #[must_use]
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0000 => Self::Success,
            0x0001 => Self::KeyNotFound,
            0x0002 => Self::KeyExists,
            0x0003 => Self::ValueTooLarge,
            0x0004 => Self::InvalidArguments,
            0x0005 => Self::ItemNotStored,
            0x0006 => Self::IncrDecrOnNonNumeric,
            0x0007 => Self::VBucketBelongsToAnotherServer,
            0x0020 => Self::AuthenticationError,
            0x0081 => Self::UnknownCommand,
            0x0082 => Self::OutOfMemory,
            0x0083 => Self::NotSupported,
            0x0084 => Self::InternalError,
            0x0085 => Self::Busy,
            0x0086 => Self::TemporaryFailure,
            0x00c0 => Self::SubDocPathNotFound,
            0x00c1 => Self::SubDocPathMismatch,
            0x00c9 => Self::SubDocPathExists,
            other => Self::Other(other),
        }
    }

    /// Check if the status indicates success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Decoded response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationHeader {
    /// Frame direction.
    pub magic: Magic,
    /// Raw opcode byte.
    pub opcode: u8,
    /// Key length.
    pub key_length: u16,
    /// Extras length.
    pub extras_length: u8,
    /// Datatype flags.
    pub datatype: u8,
    /// Raw status (responses) or vbucket id (requests).
    pub status_or_vbucket: u16,
    /// Total body length (extras + key + path + value).
    pub body_length: u32,
    /// Correlation id.
    pub opaque: u32,
    /// CAS.
    pub cas: u64,
}

impl OperationHeader {
    /// Parse a header from the first [`HEADER_LEN`] bytes of `src`.
    pub fn parse(src: &[u8]) -> Result<Self, ProtocolError> {
        if src.len() < HEADER_LEN {
            return Err(ProtocolError::IncompleteFrame {
                expected: HEADER_LEN,
                actual: src.len(),
            });
        }
        let c = ByteConverter::new();
        Ok(Self {
            magic: Magic::from_u8(src[offsets::MAGIC])?,
            opcode: src[offsets::OPCODE],
            key_length: c.read_u16(&src[offsets::KEY_LENGTH..])?,
            extras_length: src[offsets::EXTRAS_LENGTH],
            datatype: src[offsets::DATATYPE],
            status_or_vbucket: c.read_u16(&src[offsets::STATUS..])?,
            body_length: c.read_u32(&src[offsets::BODY_LENGTH..])?,
            opaque: c.read_u32(&src[offsets::OPAQUE..])?,
            cas: c.read_u64(&src[offsets::CAS..])?,
        })
    }

    /// Response status.
    #[must_use]
    pub fn status(&self) -> ResponseStatus {
        ResponseStatus::from_u16(self.status_or_vbucket)
    }

    /// Offset of the extras segment.
    #[must_use]
    pub const fn extras_offset(&self) -> usize {
        HEADER_LEN
    }

    /// Offset of the value, past extras and key.
    #[must_use]
    pub const fn body_offset(&self) -> usize {
        HEADER_LEN + self.extras_length as usize + self.key_length as usize
    }

    /// Length of the value, excluding extras and key.
    #[must_use]
    pub const fn value_length(&self) -> usize {
        (self.body_length as usize).saturating_sub(self.extras_length as usize + self.key_length as usize)
    }

    /// Total frame length, header included.
    #[must_use]
    pub const fn frame_length(&self) -> usize {
        HEADER_LEN + self.body_length as usize
    }
}
