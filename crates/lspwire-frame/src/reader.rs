use std::io::{BufReader, ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use lspwire_transport::Stream;
use tracing::trace;

use crate::codec::{FrameConfig, Message};
use crate::error::{FrameError, Result};
use crate::header::{parse_headers, Headers};

/// Reads framed messages from any `Read` stream.
///
/// Handles partial reads internally: a body is only returned once all of its
/// declared bytes have arrived.
pub struct MessageReader<T> {
    inner: BufReader<T>,
    config: FrameConfig,
}

impl<T: Read> MessageReader<T> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner: BufReader::new(inner),
            config,
        }
    }

    /// Read the next header block (blocking).
    pub fn read_headers(&mut self) -> Result<Headers> {
        let headers = parse_headers(&mut self.inner)?;
        trace!(count = headers.len(), "parsed header block");
        Ok(headers)
    }

    /// Read exactly `len` body bytes (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` if the stream ends first.
    pub fn read_body(&mut self, len: usize) -> Result<Bytes> {
        if len > self.config.max_content_length {
            return Err(FrameError::ContentTooLarge {
                size: len,
                max: self.config.max_content_length,
            });
        }

        let mut body = BytesMut::zeroed(len);
        let mut filled = 0usize;
        while filled < len {
            match self.inner.read(&mut body[filled..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(body.freeze())
    }

    /// Read one complete message: header block, then the body it declares.
    pub fn read_message(&mut self) -> Result<Message> {
        let headers = self.read_headers()?;
        let body = self.read_body(headers.content_length()?)?;
        Ok(Message { headers, body })
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        self.inner.get_ref()
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl MessageReader<Stream> {
    /// Create a reader for a transport stream and apply its read timeout.
    pub fn with_config_stream(inner: Stream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: lspwire_transport::TransportError) -> FrameError {
    match err {
        lspwire_transport::TransportError::Io(io)
        | lspwire_transport::TransportError::Accept(io) => FrameError::Io(io),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
