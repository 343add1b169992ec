//! Classic observe.
//!
//! The key travels in the body rather than the key segment, and the server
//! reports persistence and replication timings in the CAS field of the
//! response header.

use bytes::{BufMut, Bytes, BytesMut};

use crate::converter::ByteConverter;
use crate::error::ProtocolError;
use crate::header::{OpCode, OperationHeader, offsets};
use crate::operation::{Operation, OperationCommon, segment};

/// State of a key on the observed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    /// In memory, not yet on disk.
    #[default]
    FoundNotPersisted,
    /// Persisted to disk.
    FoundPersisted,
    /// Not present.
    NotFound,
    /// Deleted, not yet purged.
    LogicalDeleted,
    /// Unrecognized state byte.
    Unknown(u8),
}

impl KeyState {
    /// Map a wire state byte.
    #[must_use]
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => Self::FoundNotPersisted,
            0x01 => Self::FoundPersisted,
            0x80 => Self::NotFound,
            0x81 => Self::LogicalDeleted,
            other => Self::Unknown(other),
        }
    }
}

/// Decoded observe response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObserveState {
    /// Average persistence time reported by the node.
    pub persist_stat: u32,
    /// Average replication time reported by the node.
    pub repl_stat: u32,
    /// Partition id.
    pub vbucket_id: u16,
    /// Observed key.
    pub key: String,
    /// State of the key.
    pub key_state: KeyState,
    /// Current CAS of the key.
    pub cas: u64,
}

/// Observes persistence and replication state of a single key.
#[derive(Debug, Clone)]
pub struct Observe {
    common: OperationCommon,
}

impl Observe {
    /// Observe `key` in `vbucket_id`.
    #[must_use]
    pub fn new(key: impl Into<String>, vbucket_id: u16) -> Self {
        Self {
            common: OperationCommon::with_key(key).vbucket(vbucket_id),
        }
    }

    /// Retry copy with response state cleared.
    #[must_use]
    pub fn clone_for_retry(&self) -> Self {
        Self {
            common: self.common.retry_copy(),
        }
    }
}

impl Operation for Observe {
    type Value = ObserveState;

    fn opcode(&self) -> OpCode {
        OpCode::Observe
    }

    fn common(&self) -> &OperationCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut OperationCommon {
        &mut self.common
    }

    fn requires_key(&self) -> bool {
        false
    }

    fn key_segment(&self) -> &[u8] {
        &[]
    }

    fn header_vbucket(&self) -> Option<u16> {
        None
    }

    fn body(&self) -> Result<Bytes, ProtocolError> {
        let opcode = self.opcode() as u8;
        let key = self.common.key_bytes();
        if key.is_empty() {
            return Err(ProtocolError::MissingKey { opcode });
        }
        let vbucket = self
            .common
            .vbucket_id
            .ok_or(ProtocolError::MissingVBucket { opcode })?;
        let key_len = u16::try_from(key.len()).map_err(|_| ProtocolError::SegmentTooLong {
            segment: "key",
            length: key.len(),
            max: u16::MAX as usize,
        })?;

        let mut body = BytesMut::with_capacity(4 + key.len());
        body.put_u16(vbucket);
        body.put_u16(key_len);
        body.put_slice(key);
        Ok(body.freeze())
    }

    fn parse_value(&self, frame: &[u8], header: &OperationHeader) -> Result<ObserveState, ProtocolError> {
        let c = ByteConverter::new();
        let persist_stat = c.read_u32(segment(frame, offsets::CAS, 4)?)?;
        let repl_stat = c.read_u32(segment(frame, offsets::CAS + 4, 4)?)?;

        let mut offset = header.body_offset();
        let vbucket_id = c.read_u16(segment(frame, offset, 2)?)?;
        offset += 2;
        let key_len = c.read_u16(segment(frame, offset, 2)?)? as usize;
        offset += 2;
        let key = c.read_string(segment(frame, offset, key_len)?)?;
        offset += key_len;
        let key_state = KeyState::from_u8(c.read_u8(segment(frame, offset, 1)?)?);
        offset += 1;
        let cas = c.read_u64(segment(frame, offset, 8)?)?;

        Ok(ObserveState {
            persist_stat,
            repl_stat,
            vbucket_id,
            key,
            key_state,
            cas,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::header::ResponseStatus;

    fn response(key: &[u8], truncate: usize) -> Bytes {
        let value_len = 2 + 2 + key.len() + 1 + 8;
        let mut buf = BytesMut::new();
        buf.put_u8(0x81);
        buf.put_u8(OpCode::Observe as u8);
        buf.put_u16(0);
        buf.put_u8(0);
        buf.put_u8(0);
        buf.put_u16(0);
        buf.put_u32(value_len as u32);
        buf.put_u32(0);
        buf.put_u32(1500); // persist stat
        buf.put_u32(250); // repl stat
        buf.put_u16(33);
        buf.put_u16(key.len() as u16);
        buf.put_slice(key);
        buf.put_u8(0x01);
        buf.put_u64(0xCAFE);
        buf.truncate(buf.len() - truncate);
        buf.freeze()
    }

    #[test]
    fn test_request_body() {
        let op = Observe::new("user::1", 33);
        let frame = op.write().unwrap();
        assert_eq!(&frame[2..4], &[0, 0]);
        assert_eq!(&frame[6..8], &[0, 0]);
        assert_eq!(&frame[8..12], &[0, 0, 0, 11]);
        assert_eq!(&frame[24..26], &[0, 33]);
        assert_eq!(&frame[26..28], &[0, 7]);
        assert_eq!(&frame[28..], b"user::1");
    }

    #[test]
    fn test_request_without_vbucket_fails() {
        let op = Observe {
            common: OperationCommon::with_key("k"),
        };
        assert_eq!(
            op.write().unwrap_err(),
            ProtocolError::MissingVBucket { opcode: 0x92 }
        );
    }

    #[test]
    fn test_parse_response() {
        let mut op = Observe::new("user::1", 33);
        op.read(response(b"user::1", 0));
        let state = op.value();
        assert_eq!(state.persist_stat, 1500);
        assert_eq!(state.repl_stat, 250);
        assert_eq!(state.vbucket_id, 33);
        assert_eq!(state.key, "user::1");
        assert_eq!(state.key_state, KeyState::FoundPersisted);
        assert_eq!(state.cas, 0xCAFE);
    }

    #[test]
    fn test_truncated_response() {
        let mut op = Observe::new("user::1", 33);
        op.read(response(b"user::1", 3));
        assert_eq!(op.value(), ObserveState::default());
        assert_eq!(op.common().status(), ResponseStatus::ClientFailure);
    }
}
