//! Request/response operation model.
//!
//! An operation is built once per call, serialized with
//! [`Operation::write`], sent, and then fed the raw response frame with
//! [`Operation::read`]. [`Operation::value`] parses the typed result.
//!
//! Decoding never fails loudly: a malformed or truncated response is stored
//! as the operation's [`fault`](OperationCommon::fault) and its status
//! becomes [`ResponseStatus::ClientFailure`].

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use bytes::{BufMut, Bytes, BytesMut};

use crate::converter::ByteConverter;
use crate::error::ProtocolError;
use crate::header::{HEADER_LEN, Magic, OpCode, OperationHeader, ResponseStatus, datatype, offsets};

/// Identifies a specific write for durability tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutationToken {
    /// Partition the write landed in.
    pub vbucket_id: u16,
    /// UUID of the partition history branch.
    pub vbucket_uuid: u64,
    /// Sequence number of the write.
    pub sequence_number: u64,
}

impl MutationToken {
    /// Create a mutation token.
    #[must_use]
    pub const fn new(vbucket_id: u16, vbucket_uuid: u64, sequence_number: u64) -> Self {
        Self {
            vbucket_id,
            vbucket_uuid,
            sequence_number,
        }
    }
}

/// Server error-map entry attached to a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode {
    /// Raw status code.
    pub code: u16,
    /// Symbolic name.
    pub name: String,
    /// Whether the error map asks clients to retry.
    pub retry: bool,
}

/// Generates correlation ids for a connection or client.
#[derive(Debug)]
pub struct OpaqueGenerator {
    next: AtomicU32,
}

impl OpaqueGenerator {
    /// Create a generator starting at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// Next opaque value; wraps on overflow.
    pub fn next(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for OpaqueGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared by every operation type.
#[derive(Debug, Clone)]
pub struct OperationCommon {
    /// Document key.
    pub key: Option<String>,
    /// Partition the key maps to.
    pub vbucket_id: Option<u16>,
    /// Correlation id echoed by the server.
    pub opaque: u32,
    /// Compare-and-swap value.
    pub cas: u64,
    /// Number of times the operation has been sent.
    pub attempts: u32,
    /// When the operation was first created.
    pub created_at: Instant,
    /// Bucket the operation targets.
    pub bucket_name: Option<String>,
    /// Last error-map entry seen for this operation.
    pub error_code: Option<ErrorCode>,
    /// Token returned by a mutation, or queried by an observation.
    pub mutation_token: Option<MutationToken>,
    header: Option<OperationHeader>,
    response: Option<Bytes>,
    status: ResponseStatus,
    fault: Option<ProtocolError>,
}

impl Default for OperationCommon {
    fn default() -> Self {
        Self {
            key: None,
            vbucket_id: None,
            opaque: 0,
            cas: 0,
            attempts: 0,
            created_at: Instant::now(),
            bucket_name: None,
            error_code: None,
            mutation_token: None,
            header: None,
            response: None,
            status: ResponseStatus::Success,
            fault: None,
        }
    }
}

impl OperationCommon {
    /// Common state for an operation on `key`.
    #[must_use]
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Set the partition id.
    #[must_use]
    pub fn vbucket(mut self, vbucket_id: u16) -> Self {
        self.vbucket_id = Some(vbucket_id);
        self
    }

    /// Key bytes, or an empty slice.
    #[must_use]
    pub fn key_bytes(&self) -> &[u8] {
        self.key.as_deref().map_or(&[], str::as_bytes)
    }

    /// Decoded response header, once a response was read.
    #[must_use]
    pub fn header(&self) -> Option<&OperationHeader> {
        self.header.as_ref()
    }

    /// Raw response frame, once a response was read.
    #[must_use]
    pub fn response(&self) -> Option<&Bytes> {
        self.response.as_ref()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    /// Decoding fault recorded while reading the response.
    #[must_use]
    pub fn fault(&self) -> Option<&ProtocolError> {
        self.fault.as_ref()
    }

    /// Record a client-side failure.
    pub fn handle_client_error(&mut self, fault: ProtocolError) {
        tracing::debug!(opaque = self.opaque, error = %fault, "failed to decode response");
        self.fault = Some(fault);
        self.status = ResponseStatus::ClientFailure;
    }

    /// Copy for a retry: correlation fields are kept, response state is not.
    #[must_use]
    pub fn retry_copy(&self) -> Self {
        Self {
            key: self.key.clone(),
            vbucket_id: self.vbucket_id,
            opaque: self.opaque,
            cas: self.cas,
            attempts: self.attempts,
            created_at: self.created_at,
            bucket_name: self.bucket_name.clone(),
            error_code: self.error_code.clone(),
            mutation_token: self.mutation_token,
            header: None,
            response: None,
            status: ResponseStatus::Success,
            fault: None,
        }
    }
}

/// Check that a value segment `[start, start + len)` is inside `frame`.
pub(crate) fn segment(frame: &[u8], start: usize, len: usize) -> Result<&[u8], ProtocolError> {
    frame
        .get(start..start + len)
        .ok_or(ProtocolError::IncompleteFrame {
            expected: start + len,
            actual: frame.len(),
        })
}

/// Value segment of a response, as declared by its header.
pub(crate) fn value_segment<'a>(
    frame: &'a [u8],
    header: &OperationHeader,
) -> Result<&'a [u8], ProtocolError> {
    segment(frame, header.body_offset(), header.value_length())
}

/// Read a mutation token from 16 bytes of response extras.
///
/// The server only returns a token when the connection negotiated
/// sequence numbers, so absence is not an error.
pub(crate) fn read_mutation_token(
    frame: &[u8],
    header: &OperationHeader,
    vbucket_id: Option<u16>,
) -> Result<Option<MutationToken>, ProtocolError> {
    let Some(vbucket_id) = vbucket_id else {
        return Ok(None);
    };
    if header.extras_length < 16 {
        return Ok(None);
    }
    let c = ByteConverter::new();
    let extras = segment(frame, header.extras_offset(), 16)?;
    Ok(Some(MutationToken::new(
        vbucket_id,
        c.read_u64(extras)?,
        c.read_u64(&extras[8..])?,
    )))
}

fn check_len(segment: &'static str, length: usize, max: usize) -> Result<(), ProtocolError> {
    if length > max {
        return Err(ProtocolError::SegmentTooLong {
            segment,
            length,
            max,
        });
    }
    Ok(())
}

/// A single request/response exchange.
pub trait Operation {
    /// Typed result parsed from a successful response.
    type Value: Default;

    /// Opcode of the request.
    fn opcode(&self) -> OpCode;

    /// Shared operation state.
    fn common(&self) -> &OperationCommon;

    /// Mutable shared operation state.
    fn common_mut(&mut self) -> &mut OperationCommon;

    /// Whether the request must carry a key.
    fn requires_key(&self) -> bool {
        true
    }

    /// Bytes written to the key segment.
    fn key_segment(&self) -> &[u8] {
        self.common().key_bytes()
    }

    /// VBucket id written to header bytes 6-7.
    fn header_vbucket(&self) -> Option<u16> {
        self.common().vbucket_id
    }

    /// Datatype byte.
    fn datatype(&self) -> u8 {
        datatype::RAW
    }

    /// Extras segment.
    fn extras(&self) -> Result<Bytes, ProtocolError> {
        Ok(Bytes::new())
    }

    /// Path segment, written between key and body.
    fn path(&self) -> &[u8] {
        &[]
    }

    /// Body segment.
    fn body(&self) -> Result<Bytes, ProtocolError> {
        Ok(Bytes::new())
    }

    /// Whether a failed attempt may be resent automatically.
    fn can_retry(&self) -> bool {
        self.common().error_code.as_ref().is_none_or(|e| e.retry)
    }

    /// Read response extras into the operation.
    fn read_extras(&mut self, _frame: &[u8], _header: &OperationHeader) -> Result<(), ProtocolError> {
        Ok(())
    }

    /// Parse the typed value from a successful response frame.
    fn parse_value(&self, frame: &[u8], header: &OperationHeader) -> Result<Self::Value, ProtocolError>;

    /// Serialize the request frame: header, extras, key, path, body.
    fn write(&self) -> Result<Bytes, ProtocolError> {
        let opcode = self.opcode() as u8;
        let key = self.key_segment();
        if self.requires_key() && key.is_empty() {
            return Err(ProtocolError::MissingKey { opcode });
        }
        let extras = self.extras()?;
        let path = self.path();
        let body = self.body()?;

        check_len("key", key.len(), u16::MAX as usize)?;
        check_len("extras", extras.len(), u8::MAX as usize)?;
        let total = extras.len() + key.len() + path.len() + body.len();
        check_len("body", total, u32::MAX as usize)?;

        let common = self.common();
        let c = ByteConverter::new();
        let mut header = [0u8; HEADER_LEN];
        header[offsets::MAGIC] = Magic::Request as u8;
        header[offsets::OPCODE] = opcode;
        c.write_u16(key.len() as u16, &mut header[offsets::KEY_LENGTH..])?;
        header[offsets::EXTRAS_LENGTH] = extras.len() as u8;
        header[offsets::DATATYPE] = self.datatype();
        if let Some(vbucket) = self.header_vbucket() {
            c.write_u16(vbucket, &mut header[offsets::VBUCKET..])?;
        }
        c.write_u32(total as u32, &mut header[offsets::BODY_LENGTH..])?;
        c.write_u32(common.opaque, &mut header[offsets::OPAQUE..])?;
        c.write_u64(common.cas, &mut header[offsets::CAS..])?;

        let mut buf = BytesMut::with_capacity(HEADER_LEN + total);
        buf.put_slice(&header);
        buf.put_slice(&extras);
        buf.put_slice(key);
        buf.put_slice(path);
        buf.put_slice(&body);
        Ok(buf.freeze())
    }

    /// Assign the raw response frame.
    ///
    /// Header or extras decoding failures are recorded on the operation
    /// rather than returned.
    fn read(&mut self, frame: Bytes) {
        let header = match OperationHeader::parse(&frame) {
            Ok(header) => header,
            Err(e) => {
                self.common_mut().handle_client_error(e);
                return;
            }
        };
        {
            let common = self.common_mut();
            common.status = header.status();
            common.cas = header.cas;
            common.header = Some(header);
            common.response = Some(frame.clone());
        }
        if let Err(e) = self.read_extras(&frame, &header) {
            self.common_mut().handle_client_error(e);
        }
    }

    /// Whether the response reported success.
    fn success(&self) -> bool {
        self.common().status.is_success()
    }

    /// Parse the typed value.
    ///
    /// Returns the default value if the operation failed, has no response,
    /// or the response could not be decoded; in the last case the fault is
    /// recorded and the status becomes [`ResponseStatus::ClientFailure`].
    fn value(&mut self) -> Self::Value {
        if !self.success() {
            return Self::Value::default();
        }
        let (Some(frame), Some(header)) = (
            self.common().response.clone(),
            self.common().header,
        ) else {
            return Self::Value::default();
        };
        match self.parse_value(&frame, &header) {
            Ok(value) => value,
            Err(e) => {
                self.common_mut().handle_client_error(e);
                Self::Value::default()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Touch {
        common: OperationCommon,
        extras: Vec<u8>,
    }

    impl Operation for Touch {
        type Value = Vec<u8>;

        fn opcode(&self) -> OpCode {
            OpCode::Get
        }

        fn common(&self) -> &OperationCommon {
            &self.common
        }

        fn common_mut(&mut self) -> &mut OperationCommon {
            &mut self.common
        }

        fn extras(&self) -> Result<Bytes, ProtocolError> {
            Ok(Bytes::from(self.extras.clone()))
        }

        fn parse_value(&self, frame: &[u8], header: &OperationHeader) -> Result<Vec<u8>, ProtocolError> {
            Ok(value_segment(frame, header)?.to_vec())
        }
    }

    fn response(body: &[u8], declared: u32, status: u16) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_u8(0x81);
        buf.put_u8(0x00);
        buf.put_u16(0);
        buf.put_u8(0);
        buf.put_u8(0);
        buf.put_u16(status);
        buf.put_u32(declared);
        buf.put_u32(5);
        buf.put_u64(77);
        buf.put_slice(body);
        buf.freeze()
    }

    #[test]
    fn test_write_layout() {
        let mut common = OperationCommon::with_key("doc");
        common.opaque = 0x0A0B_0C0D;
        common.vbucket_id = Some(0x0102);
        common.cas = 9;
        let op = Touch {
            common,
            extras: vec![0xEE, 0xFF],
        };

        let frame = op.write().unwrap();
        assert_eq!(frame.len(), 24 + 2 + 3);
        assert_eq!(frame[0], 0x80);
        assert_eq!(&frame[2..4], &[0, 3]);
        assert_eq!(frame[4], 2);
        assert_eq!(&frame[6..8], &[0x01, 0x02]);
        assert_eq!(&frame[8..12], &[0, 0, 0, 5]);
        assert_eq!(&frame[12..16], &[0x0A, 0x0B, 0x0C, 0x0D]);
        assert_eq!(frame[23], 9);
        assert_eq!(&frame[24..26], &[0xEE, 0xFF]);
        assert_eq!(&frame[26..], b"doc");
    }

    #[test]
    fn test_write_requires_key() {
        let op = Touch {
            common: OperationCommon::default(),
            extras: Vec::new(),
        };
        assert_eq!(op.write().unwrap_err(), ProtocolError::MissingKey { opcode: 0 });
    }

    #[test]
    fn test_read_and_value() {
        let mut op = Touch {
            common: OperationCommon::with_key("doc"),
            extras: Vec::new(),
        };
        op.read(response(b"hello", 5, 0));
        assert!(op.success());
        assert_eq!(op.common().cas, 77);
        assert_eq!(op.value(), b"hello".to_vec());
    }

    #[test]
    fn test_truncated_value_becomes_client_failure() {
        let mut op = Touch {
            common: OperationCommon::with_key("doc"),
            extras: Vec::new(),
        };
        op.read(response(b"hel", 5, 0));
        assert!(op.value().is_empty());
        assert_eq!(op.common().status(), ResponseStatus::ClientFailure);
        assert!(matches!(
            op.common().fault(),
            Some(ProtocolError::IncompleteFrame { .. })
        ));
    }

    #[test]
    fn test_short_header_becomes_client_failure() {
        let mut op = Touch {
            common: OperationCommon::with_key("doc"),
            extras: Vec::new(),
        };
        op.read(Bytes::from_static(&[0x81, 0x00, 0x00]));
        assert!(!op.success());
        assert_eq!(op.common().status(), ResponseStatus::ClientFailure);
    }

    #[test]
    fn test_failed_status_yields_default() {
        let mut op = Touch {
            common: OperationCommon::with_key("doc"),
            extras: Vec::new(),
        };
        op.read(response(b"", 0, 0x0001));
        assert_eq!(op.common().status(), ResponseStatus::KeyNotFound);
        assert!(op.value().is_empty());
        assert!(op.common().fault().is_none());
    }

    #[test]
    fn test_retry_copy_keeps_correlation() {
        let mut common = OperationCommon::with_key("doc");
        common.opaque = 3;
        common.attempts = 2;
        common.bucket_name = Some("travel".into());
        common.error_code = Some(ErrorCode {
            code: 0x86,
            name: "ETMPFAIL".into(),
            retry: true,
        });
        let mut op = Touch {
            common,
            extras: Vec::new(),
        };
        op.read(response(b"x", 1, 0));

        let copy = op.common().retry_copy();
        assert_eq!(copy.key.as_deref(), Some("doc"));
        assert_eq!(copy.opaque, 3);
        assert_eq!(copy.attempts, 2);
        assert_eq!(copy.cas, 77);
        assert_eq!(copy.created_at, op.common().created_at);
        assert_eq!(copy.bucket_name.as_deref(), Some("travel"));
        assert_eq!(copy.error_code, op.common().error_code);
        assert!(copy.response().is_none());
    }

    #[test]
    fn test_can_retry_follows_error_map() {
        let mut op = Touch {
            common: OperationCommon::with_key("doc"),
            extras: Vec::new(),
        };
        assert!(op.can_retry());
        op.common_mut().error_code = Some(ErrorCode {
            code: 0x04,
            name: "EINVAL".into(),
            retry: false,
        });
        assert!(!op.can_retry());
    }

    #[test]
    fn test_opaque_generator() {
        let opaques = OpaqueGenerator::new();
        assert_eq!(opaques.next(), 1);
        assert_eq!(opaques.next(), 2);
    }
}
