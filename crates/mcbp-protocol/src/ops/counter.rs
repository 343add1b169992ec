//! Increment and decrement.

use bytes::{BufMut, Bytes, BytesMut};

use crate::converter::ByteConverter;
use crate::error::ProtocolError;
use crate::header::{OpCode, OperationHeader};
use crate::operation::{Operation, OperationCommon, read_mutation_token, value_segment};

/// Extras length: delta, initial value, expiry.
pub const EXTRAS_LEN: usize = 20;

/// Adjusts a numeric document, creating it with an initial value if absent.
///
/// Counters are never retried automatically: a resent request may apply
/// the delta twice.
#[derive(Debug, Clone)]
pub struct Counter {
    common: OperationCommon,
    opcode: OpCode,
    delta: u64,
    initial: u64,
    expiry: u32,
}

impl Counter {
    fn new(opcode: OpCode, key: impl Into<String>) -> Self {
        Self {
            common: OperationCommon::with_key(key),
            opcode,
            delta: 1,
            initial: 1,
            expiry: 0,
        }
    }

    /// Increment `key`.
    #[must_use]
    pub fn increment(key: impl Into<String>) -> Self {
        Self::new(OpCode::Increment, key)
    }

    /// Decrement `key`.
    #[must_use]
    pub fn decrement(key: impl Into<String>) -> Self {
        Self::new(OpCode::Decrement, key)
    }

    /// Amount to add or subtract.
    #[must_use]
    pub fn with_delta(mut self, delta: u64) -> Self {
        self.delta = delta;
        self
    }

    /// Value stored when the document does not exist.
    #[must_use]
    pub fn with_initial(mut self, initial: u64) -> Self {
        self.initial = initial;
        self
    }

    /// Document expiry; zero means none.
    #[must_use]
    pub fn with_expiry(mut self, expiry: u32) -> Self {
        self.expiry = expiry;
        self
    }

    /// Set the partition id.
    #[must_use]
    pub fn with_vbucket(mut self, vbucket_id: u16) -> Self {
        self.common.vbucket_id = Some(vbucket_id);
        self
    }

    /// Retry copy with response state cleared.
    #[must_use]
    pub fn clone_for_retry(&self) -> Self {
        Self {
            common: self.common.retry_copy(),
            ..self.clone()
        }
    }
}

impl Operation for Counter {
    type Value = u64;

    fn opcode(&self) -> OpCode {
        self.opcode
    }

    fn common(&self) -> &OperationCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut OperationCommon {
        &mut self.common
    }

    fn extras(&self) -> Result<Bytes, ProtocolError> {
        let mut extras = BytesMut::with_capacity(EXTRAS_LEN);
        extras.put_u64(self.delta);
        extras.put_u64(self.initial);
        extras.put_u32(self.expiry);
        Ok(extras.freeze())
    }

    fn can_retry(&self) -> bool {
        false
    }

    fn read_extras(&mut self, frame: &[u8], header: &OperationHeader) -> Result<(), ProtocolError> {
        if let Some(token) = read_mutation_token(frame, header, self.common.vbucket_id)? {
            self.common.mutation_token = Some(token);
        }
        Ok(())
    }

    fn parse_value(&self, frame: &[u8], header: &OperationHeader) -> Result<u64, ProtocolError> {
        ByteConverter::new().read_u64(value_segment(frame, header)?)
    }
}
