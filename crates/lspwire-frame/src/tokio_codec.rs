use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_message, encode_message, FrameConfig, Message};
use crate::error::{FrameError, Result};
use crate::header::trim_line_end;

/// `tokio-util` codec over the `Content-Length` wire format.
#[derive(Debug, Clone, Default)]
pub struct MessageCodec {
    config: FrameConfig,
}

impl MessageCodec {
    pub fn new(config: FrameConfig) -> Self {
        Self { config }
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        decode_message(src, self.config.max_content_length)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None if header_block_complete(src) => Err(FrameError::ConnectionClosed),
            None => Err(FrameError::headers_eof()),
        }
    }
}

fn header_block_complete(src: &[u8]) -> bool {
    src.split_inclusive(|b| *b == b'\n')
        .any(|line| line.ends_with(b"\n") && trim_line_end(line).is_empty())
}

impl Encoder<Bytes> for MessageCodec {
    type Error = FrameError;

    fn encode(&mut self, body: Bytes, dst: &mut BytesMut) -> Result<()> {
        if body.len() > self.config.max_content_length {
            return Err(FrameError::ContentTooLarge {
                size: body.len(),
                max: self.config.max_content_length,
            });
        }
        encode_message(body.as_ref(), dst);
        Ok(())
    }
}
