//! `Content-Length` header framing for JSON-RPC message streams.
//!
//! Every message on the wire is:
//! - a header block of `Name: value` lines (names case-insensitive),
//! - one empty line,
//! - exactly `Content-Length` bytes of body.
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod header;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod tokio_codec;

pub use codec::{decode_message, encode_message, FrameConfig, Message, DEFAULT_MAX_CONTENT_LENGTH};
pub use error::{FrameError, Result};
pub use header::{parse_headers, Headers, CONTENT_LENGTH};
pub use reader::MessageReader;
pub use writer::MessageWriter;

#[cfg(feature = "async")]
pub use tokio_codec::MessageCodec;
