//! # mcbp-protocol
//!
//! Memcached binary protocol framing with the document-database extensions
//! used by KV clients: paths, durability tokens and sub-document operations.
//!
//! This crate is pure: it builds request frames and decodes response frames
//! without performing any I/O. See `kv-codec` for stream framing.
//!
//! ## Features
//!
//! - Network-order byte conversion with bounds-checked reads
//! - 24-byte header encoding and decoding
//! - Feature negotiation, observe, sequence-number observe, counters and
//!   single-path sub-document operations
//! - Malformed responses surface as a client failure status, never a panic
//!
//! ## Example
//!
//! ```
//! use mcbp_protocol::{MutationToken, Operation, ops::ObserveSeqno};
//!
//! let op = ObserveSeqno::new(MutationToken::new(7, 0x1122_3344_5566_7788, 10));
//! let frame = op.write().unwrap();
//! assert_eq!(frame.len(), 32);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod converter;
pub mod error;
pub mod header;
pub mod operation;
pub mod ops;

pub use converter::{ByteConverter, ByteOrder, FixedWidth};
pub use error::ProtocolError;
pub use header::{HEADER_LEN, Magic, OpCode, OperationHeader, ResponseStatus};
pub use operation::{ErrorCode, MutationToken, OpaqueGenerator, Operation, OperationCommon};
