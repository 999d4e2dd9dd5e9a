use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::header::{parse_header_line, trim_line_end, Headers, MAX_HEADER_BLOCK};

/// Default maximum body size: 16 MiB.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

/// A complete framed message: its header block and exactly
/// `Content-Length` bytes of body.
#[derive(Debug, Clone)]
pub struct Message {
    pub headers: Headers,
    pub body: Bytes,
}

impl Message {
    /// The total wire size of this message when re-encoded with only a
    /// `Content-Length` header.
    pub fn wire_size(&self) -> usize {
        header_prefix(self.body.len()).len() + self.body.len()
    }
}

fn header_prefix(len: usize) -> String {
    format!("Content-Length: {len}\r\n\r\n")
}

/// Encode a body into the wire format.
///
/// Wire format:
/// ```text
/// Content-Length: <N>\r\n
/// \r\n
/// <N bytes of body>
/// ```
pub fn encode_message(body: &[u8], dst: &mut BytesMut) {
    let prefix = header_prefix(body.len());
    dst.reserve(prefix.len() + body.len());
    dst.put_slice(prefix.as_bytes());
    dst.put_slice(body);
}

/// Decode a message from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't hold a complete message yet.
/// On success, consumes the message bytes from the buffer. Header lines are
/// validated as soon as they are complete.
pub fn decode_message(src: &mut BytesMut, max_content_length: usize) -> Result<Option<Message>> {
    let mut headers = Headers::new();
    let mut pos = 0usize;

    let body_start = loop {
        let Some(offset) = src[pos..].iter().position(|b| *b == b'\n') else {
            if src.len() > MAX_HEADER_BLOCK {
                return Err(FrameError::HeaderTooLarge {
                    max: MAX_HEADER_BLOCK,
                });
            }
            return Ok(None);
        };
        let end = pos + offset + 1;
        if end > MAX_HEADER_BLOCK {
            return Err(FrameError::HeaderTooLarge {
                max: MAX_HEADER_BLOCK,
            });
        }

        let line = trim_line_end(&src[pos..end]);
        if line.is_empty() {
            break end;
        }
        let (name, value) = parse_header_line(line)?;
        headers.insert(&name, value);
        pos = end;
    };

    let content_length = headers.content_length()?;
    if content_length > max_content_length {
        return Err(FrameError::ContentTooLarge {
            size: content_length,
            max: max_content_length,
        });
    }

    if src.len() < body_start + content_length {
        src.reserve(body_start + content_length - src.len());
        return Ok(None);
    }

    let _ = src.split_to(body_start);
    let body = src.split_to(content_length).freeze();
    Ok(Some(Message { headers, body }))
}

/// Configuration for message readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum accepted `Content-Length`. Default: 16 MiB.
    pub max_content_length: usize,
    /// Read timeout for blocking operations. Default: none.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations. Default: none.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
