//! Feature negotiation.

use bytes::{BufMut, Bytes, BytesMut};

use crate::converter::ByteConverter;
use crate::error::ProtocolError;
use crate::header::{OpCode, OperationHeader};
use crate::operation::{Operation, OperationCommon};

/// Maximum length of the agent string sent in the hello key.
pub const MAX_AGENT_LEN: usize = 200;

/// Feature codes a client may request during negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ServerFeature {
    /// Datatype byte is honored.
    Datatype = 0x01,
    /// TLS transport.
    Tls = 0x02,
    /// Disable Nagle on the server side.
    TcpNoDelay = 0x03,
    /// Mutations return sequence-number tokens.
    MutationSeqno = 0x04,
    /// Enable Nagle on the server side.
    TcpDelay = 0x05,
    /// Extended attributes.
    Xattr = 0x06,
    /// Extended error codes.
    XError = 0x07,
    /// Bucket selection after authentication.
    SelectBucket = 0x08,
    /// Snappy compression.
    Snappy = 0x0a,
    /// JSON datatype.
    Json = 0x0b,
    /// Server-initiated requests.
    Duplex = 0x0c,
    /// Server pushes cluster map changes.
    ClustermapChangeNotification = 0x0d,
    /// Responses may arrive out of order.
    UnorderedExecution = 0x0e,
    /// Server-side duration in responses.
    Tracing = 0x0f,
}

impl ServerFeature {
    /// Map a wire feature code.
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x01 => Some(Self::Datatype),
            0x02 => Some(Self::Tls),
            0x03 => Some(Self::TcpNoDelay),
            0x04 => Some(Self::MutationSeqno),
            0x05 => Some(Self::TcpDelay),
            0x06 => Some(Self::Xattr),
            0x07 => Some(Self::XError),
            0x08 => Some(Self::SelectBucket),
            0x0a => Some(Self::Snappy),
            0x0b => Some(Self::Json),
            0x0c => Some(Self::Duplex),
            0x0d => Some(Self::ClustermapChangeNotification),
            0x0e => Some(Self::UnorderedExecution),
            0x0f => Some(Self::Tracing),
            _ => None,
        }
    }
}

/// Negotiates protocol features with the server.
///
/// The key identifies the client; see [`Hello::build_key`].
#[derive(Debug, Clone)]
pub struct Hello {
    common: OperationCommon,
    features: Vec<u16>,
}

impl Hello {
    /// Request the given feature codes.
    #[must_use]
    pub fn new(key: impl Into<String>, features: Vec<u16>) -> Self {
        Self {
            common: OperationCommon::with_key(key),
            features,
        }
    }

    /// Request the given known features.
    #[must_use]
    pub fn with_features(key: impl Into<String>, features: &[ServerFeature]) -> Self {
        Self::new(key, features.iter().map(|f| *f as u16).collect())
    }

    /// Feature codes being requested.
    #[must_use]
    pub fn features(&self) -> &[u16] {
        &self.features
    }

    /// Client identification key: `{"i":"<connection id>","a":"<agent>"}`.
    ///
    /// The agent is cut to [`MAX_AGENT_LEN`] characters.
    #[must_use]
    pub fn build_key(connection_id: u64, agent: &str) -> String {
        let agent: String = agent.chars().take(MAX_AGENT_LEN).collect();
        serde_json::json!({
            "i": format!("{connection_id:016x}"),
            "a": agent,
        })
        .to_string()
    }

    /// Retry copy with response state cleared.
    #[must_use]
    pub fn clone_for_retry(&self) -> Self {
        Self {
            common: self.common.retry_copy(),
            features: self.features.clone(),
        }
    }
}

impl Operation for Hello {
    type Value = Vec<u16>;

    fn opcode(&self) -> OpCode {
        OpCode::Hello
    }

    fn common(&self) -> &OperationCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut OperationCommon {
        &mut self.common
    }

    fn body(&self) -> Result<Bytes, ProtocolError> {
        let mut body = BytesMut::with_capacity(self.features.len() * 2);
        for feature in &self.features {
            body.put_u16(*feature);
        }
        Ok(body.freeze())
    }

    /// Parses whole 2-byte slots only; a trailing odd byte or a frame
    /// shorter than declared yields fewer codes.
    fn parse_value(&self, frame: &[u8], header: &OperationHeader) -> Result<Vec<u16>, ProtocolError> {
        let start = header.body_offset().min(frame.len());
        let end = (start + header.value_length()).min(frame.len());
        let value = &frame[start..end];

        let c = ByteConverter::new();
        value.chunks_exact(2).map(|slot| c.read_u16(slot)).collect()
    }
}
