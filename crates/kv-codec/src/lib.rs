//! # kv-codec
//!
//! Async framing layer for the memcached binary protocol.
//!
//! This crate turns a raw byte stream into complete protocol frames,
//! reassembling frames split across TCP segments, and exchanges a single
//! operation over a framed transport.
//!
//! ## Features
//!
//! - Frame reassembly driven by the header's total body length
//! - Configurable maximum frame size
//! - Integration with tokio-util's codec framework
//! - Request/response round trips matched by opaque

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod frame_codec;
pub mod framed;

pub use error::CodecError;
pub use frame_codec::{DEFAULT_MAX_FRAME_SIZE, Frame, FrameCodec};
pub use framed::FrameStream;
