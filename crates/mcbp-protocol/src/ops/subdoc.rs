//! Single-path sub-document lookups and mutations.
//!
//! Both families frame their requests as header, extras, key, path, body.
//! Extras always start with the 2-byte path length and the path flags.

use bitflags::bitflags;
use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::header::{OpCode, OperationHeader, datatype};
use crate::operation::{Operation, OperationCommon, read_mutation_token, value_segment};

bitflags! {
    /// Flags applying to the path of a sub-document operation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PathFlags: u8 {
        /// Create intermediate path elements.
        const CREATE_PATH = 0x01;
        /// Path refers to an extended attribute.
        const XATTR = 0x04;
        /// Expand server macros in the value.
        const EXPAND_MACROS = 0x10;
    }
}

bitflags! {
    /// Flags applying to the whole document.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DocFlags: u8 {
        /// Create the document if it does not exist.
        const MKDOC = 0x01;
        /// Create the document, failing if it exists.
        const INSERT_DOCUMENT = 0x02;
        /// Operate on a deleted document.
        const ACCESS_DELETED = 0x04;
    }
}

fn path_len(path: &str) -> Result<u16, ProtocolError> {
    u16::try_from(path.len()).map_err(|_| ProtocolError::SegmentTooLong {
        segment: "path",
        length: path.len(),
        max: u16::MAX as usize,
    })
}

/// Remove one leading `[` and one trailing `]`, if both are present.
fn strip_brackets(value: &[u8]) -> &[u8] {
    match value {
        [b'[', inner @ .., b']'] => inner,
        other => other,
    }
}

/// Reads a single path from a document.
#[derive(Debug, Clone)]
pub struct SubDocLookup {
    common: OperationCommon,
    opcode: OpCode,
    path: String,
    path_flags: PathFlags,
    doc_flags: DocFlags,
}

impl SubDocLookup {
    fn new(opcode: OpCode, key: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            common: OperationCommon::with_key(key),
            opcode,
            path: path.into(),
            path_flags: PathFlags::empty(),
            doc_flags: DocFlags::empty(),
        }
    }

    /// Fetch the fragment at `path`.
    #[must_use]
    pub fn get(key: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(OpCode::SubGet, key, path)
    }

    /// Check whether `path` exists.
    #[must_use]
    pub fn exists(key: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(OpCode::SubExist, key, path)
    }

    /// Count the elements at `path`.
    #[must_use]
    pub fn count(key: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(OpCode::SubGetCount, key, path)
    }

    /// Set the partition id.
    #[must_use]
    pub fn with_vbucket(mut self, vbucket_id: u16) -> Self {
        self.common.vbucket_id = Some(vbucket_id);
        self
    }

    /// Set the path flags.
    #[must_use]
    pub fn with_path_flags(mut self, flags: PathFlags) -> Self {
        self.path_flags = flags;
        self
    }

    /// Set the document flags.
    #[must_use]
    pub fn with_doc_flags(mut self, flags: DocFlags) -> Self {
        self.doc_flags = flags;
        self
    }

    /// Path being read.
    #[must_use]
    pub fn path_str(&self) -> &str {
        &self.path
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

impl Operation for SubDocLookup {
    type Value = Bytes;

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
        let mut extras = BytesMut::with_capacity(4);
        extras.put_u16(path_len(&self.path)?);
        extras.put_u8(self.path_flags.bits());
        if !self.doc_flags.is_empty() {
            extras.put_u8(self.doc_flags.bits());
        }
        Ok(extras.freeze())
    }

    fn path(&self) -> &[u8] {
        self.path.as_bytes()
    }

    fn parse_value(&self, frame: &[u8], header: &OperationHeader) -> Result<Bytes, ProtocolError> {
        Ok(Bytes::copy_from_slice(value_segment(frame, header)?))
    }
}

/// Writes a single path within a document.
#[derive(Debug, Clone)]
pub struct SubDocMutation {
    common: OperationCommon,
    opcode: OpCode,
    path: String,
    value: Bytes,
    path_flags: PathFlags,
    doc_flags: DocFlags,
    expiry: u32,
    remove_brackets: bool,
}

impl SubDocMutation {
    fn new(
        opcode: OpCode,
        key: impl Into<String>,
        path: impl Into<String>,
        value: impl Into<Bytes>,
    ) -> Self {
        Self {
            common: OperationCommon::with_key(key),
            opcode,
            path: path.into(),
            value: value.into(),
            path_flags: PathFlags::empty(),
            doc_flags: DocFlags::empty(),
            expiry: 0,
            remove_brackets: false,
        }
    }

    /// Insert or replace the value at `path`.
    #[must_use]
    pub fn upsert(key: impl Into<String>, path: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self::new(OpCode::SubDictUpsert, key, path, value)
    }

    /// Insert the value at `path`, failing if it exists.
    #[must_use]
    pub fn insert(key: impl Into<String>, path: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self::new(OpCode::SubDictAdd, key, path, value)
    }

    /// Replace the value at `path`, failing if it does not exist.
    #[must_use]
    pub fn replace(key: impl Into<String>, path: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self::new(OpCode::SubReplace, key, path, value)
    }

    /// Remove the value at `path`.
    #[must_use]
    pub fn remove(key: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(OpCode::SubDelete, key, path, Bytes::new())
    }

    /// Append to the array at `path`.
    #[must_use]
    pub fn array_append(
        key: impl Into<String>,
        path: impl Into<String>,
        value: impl Into<Bytes>,
    ) -> Self {
        Self::new(OpCode::SubArrayPushLast, key, path, value)
    }

    /// Prepend to the array at `path`.
    #[must_use]
    pub fn array_prepend(
        key: impl Into<String>,
        path: impl Into<String>,
        value: impl Into<Bytes>,
    ) -> Self {
        Self::new(OpCode::SubArrayPushFirst, key, path, value)
    }

    /// Insert into an array at the index named by `path`.
    #[must_use]
    pub fn array_insert(
        key: impl Into<String>,
        path: impl Into<String>,
        value: impl Into<Bytes>,
    ) -> Self {
        Self::new(OpCode::SubArrayInsert, key, path, value)
    }

    /// Add to the array at `path` unless already present.
    #[must_use]
    pub fn array_add_unique(
        key: impl Into<String>,
        path: impl Into<String>,
        value: impl Into<Bytes>,
    ) -> Self {
        Self::new(OpCode::SubArrayAddUnique, key, path, value)
    }

    /// Add `delta` to the number at `path`.
    #[must_use]
    pub fn counter(key: impl Into<String>, path: impl Into<String>, delta: i64) -> Self {
        Self::new(OpCode::SubCounter, key, path, delta.to_string())
    }

    /// Set the partition id.
    #[must_use]
    pub fn with_vbucket(mut self, vbucket_id: u16) -> Self {
        self.common.vbucket_id = Some(vbucket_id);
        self
    }

    /// Set the compare-and-swap value.
    #[must_use]
    pub fn with_cas(mut self, cas: u64) -> Self {
        self.common.cas = cas;
        self
    }

    /// Set the document expiry; zero means none.
    #[must_use]
    pub fn with_expiry(mut self, expiry: u32) -> Self {
        self.expiry = expiry;
        self
    }

    /// Set the path flags.
    #[must_use]
    pub fn with_path_flags(mut self, flags: PathFlags) -> Self {
        self.path_flags = flags;
        self
    }

    /// Set the document flags.
    #[must_use]
    pub fn with_doc_flags(mut self, flags: DocFlags) -> Self {
        self.doc_flags = flags;
        self
    }

    /// Splice the value into the target: strip the enclosing `[` `]`.
    #[must_use]
    pub fn with_remove_brackets(mut self, remove: bool) -> Self {
        self.remove_brackets = remove;
        self
    }

    /// Path being written.
    #[must_use]
    pub fn path_str(&self) -> &str {
        &self.path
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

impl Operation for SubDocMutation {
    type Value = Bytes;

    fn opcode(&self) -> OpCode {
        self.opcode
    }

    fn common(&self) -> &OperationCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut OperationCommon {
        &mut self.common
    }

    fn datatype(&self) -> u8 {
        if self.path_flags.contains(PathFlags::XATTR) {
            datatype::XATTR
        } else {
            datatype::RAW
        }
    }

    /// Layout: path length (2), path flags (1), expiry (4, when set),
    /// doc flags (1, when set). Doc flags sit at offset 7 with an expiry
    /// and at offset 3 without.
    fn extras(&self) -> Result<Bytes, ProtocolError> {
        let mut extras = BytesMut::with_capacity(8);
        extras.put_u16(path_len(&self.path)?);
        extras.put_u8(self.path_flags.bits());
        if self.expiry > 0 {
            extras.put_u32(self.expiry);
        }
        if !self.doc_flags.is_empty() {
            extras.put_u8(self.doc_flags.bits());
        }
        Ok(extras.freeze())
    }

    fn path(&self) -> &[u8] {
        self.path.as_bytes()
    }

    fn body(&self) -> Result<Bytes, ProtocolError> {
        if self.remove_brackets {
            let stripped = strip_brackets(&self.value);
            Ok(self.value.slice_ref(stripped))
        } else {
            Ok(self.value.clone())
        }
    }

    fn read_extras(&mut self, frame: &[u8], header: &OperationHeader) -> Result<(), ProtocolError> {
        if let Some(token) = read_mutation_token(frame, header, self.common.vbucket_id)? {
            self.common.mutation_token = Some(token);
        }
        Ok(())
    }

    fn parse_value(&self, frame: &[u8], header: &OperationHeader) -> Result<Bytes, ProtocolError> {
        Ok(Bytes::copy_from_slice(value_segment(frame, header)?))
    }
}
