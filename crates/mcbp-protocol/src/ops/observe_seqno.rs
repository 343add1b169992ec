//! Sequence-number observation.

use bytes::Bytes;

use crate::converter::ByteConverter;
use crate::error::ProtocolError;
use crate::header::{OpCode, OperationHeader};
use crate::operation::{MutationToken, Operation, OperationCommon, value_segment};

/// Response length when the partition had a hard failover.
pub const HARD_FAILOVER_LEN: usize = 43;

/// Response length without failover information.
pub const NO_FAILOVER_LEN: usize = 27;

/// Persistence and replication progress of a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObserveSeqnoResponse {
    /// The partition history branch changed since the queried uuid.
    pub is_hard_failover: bool,
    /// Partition id.
    pub vbucket_id: u16,
    /// Current partition uuid.
    pub vbucket_uuid: u64,
    /// Highest sequence number persisted to disk.
    pub last_persisted_seqno: u64,
    /// Highest sequence number in memory.
    pub current_seqno: u64,
    /// Uuid the partition had before the failover.
    pub old_vbucket_uuid: u64,
    /// Last sequence number received under the old uuid.
    pub last_seqno_received: u64,
}

/// Queries how far a mutation has been persisted and replicated.
#[derive(Debug, Clone)]
pub struct ObserveSeqno {
    common: OperationCommon,
    token: MutationToken,
}

impl ObserveSeqno {
    /// Observe the partition a mutation token belongs to.
    #[must_use]
    pub fn new(token: MutationToken) -> Self {
        let mut common = OperationCommon::default().vbucket(token.vbucket_id);
        common.mutation_token = Some(token);
        Self { common, token }
    }

    /// The token being observed.
    #[must_use]
    pub fn token(&self) -> &MutationToken {
        &self.token
    }

    /// Retry copy with response state cleared.
    #[must_use]
    pub fn clone_for_retry(&self) -> Self {
        Self {
            common: self.common.retry_copy(),
            token: self.token,
        }
    }
}

impl Operation for ObserveSeqno {
    type Value = ObserveSeqnoResponse;

    fn opcode(&self) -> OpCode {
        OpCode::ObserveSeqno
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
        Some(self.token.vbucket_id)
    }

    fn body(&self) -> Result<Bytes, ProtocolError> {
        Ok(Bytes::from(self.token.vbucket_uuid.to_be_bytes().to_vec()))
    }

    fn parse_value(
        &self,
        frame: &[u8],
        header: &OperationHeader,
    ) -> Result<ObserveSeqnoResponse, ProtocolError> {
        let value = value_segment(frame, header)?;
        let is_hard_failover = value.first() == Some(&1);
        let expected = if is_hard_failover {
            HARD_FAILOVER_LEN
        } else {
            NO_FAILOVER_LEN
        };
        if value.len() < expected {
            return Err(ProtocolError::IncompleteFrame {
                expected,
                actual: value.len(),
            });
        }

        let c = ByteConverter::new();
        let mut response = ObserveSeqnoResponse {
            is_hard_failover,
            vbucket_id: c.read_u16(&value[1..])?,
            vbucket_uuid: c.read_u64(&value[3..])?,
            last_persisted_seqno: c.read_u64(&value[11..])?,
            current_seqno: c.read_u64(&value[19..])?,
            ..ObserveSeqnoResponse::default()
        };
        if is_hard_failover {
            response.old_vbucket_uuid = c.read_u64(&value[27..])?;
            response.last_seqno_received = c.read_u64(&value[35..])?;
        }
        Ok(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::header::ResponseStatus;

    fn response(value: &[u8]) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_u8(0x81);
        buf.put_u8(OpCode::ObserveSeqno as u8);
        buf.put_u16(0);
        buf.put_u8(0);
        buf.put_u8(0);
        buf.put_u16(0);
        buf.put_u32(value.len() as u32);
        buf.put_u32(0);
        buf.put_u64(0);
        buf.put_slice(value);
        buf.freeze()
    }

    #[test]
    fn test_no_failover_response() {
        let mut value = BytesMut::new();
        value.put_u8(0);
        value.put_u16(12);
        value.put_u64(0xAB);
        value.put_u64(100);
        value.put_u64(105);

        let mut op = ObserveSeqno::new(MutationToken::new(12, 0xAB, 104));
        op.read(response(&value));
        let parsed = op.value();
        assert!(!parsed.is_hard_failover);
        assert_eq!(parsed.vbucket_id, 12);
        assert_eq!(parsed.last_persisted_seqno, 100);
        assert_eq!(parsed.current_seqno, 105);
        assert_eq!(parsed.old_vbucket_uuid, 0);
    }

    #[test]
    fn test_short_failover_response_is_client_failure() {
        let mut value = BytesMut::new();
        value.put_u8(1);
        value.put_u16(12);
        value.put_u64(0xAB);
        value.put_u64(100);
        value.put_u64(105);

        let mut op = ObserveSeqno::new(MutationToken::new(12, 0xAB, 104));
        op.read(response(&value));
        assert_eq!(op.value(), ObserveSeqnoResponse::default());
        assert_eq!(op.common().status(), ResponseStatus::ClientFailure);
    }

    #[test]
    fn test_key_not_required() {
        let op = ObserveSeqno::new(MutationToken::new(1, 2, 3));
        let frame = op.write().unwrap();
        assert_eq!(frame.len(), 32);
        assert_eq!(&frame[2..4], &[0, 0]);
    }
}
