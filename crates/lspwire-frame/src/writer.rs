use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use lspwire_transport::Stream;

use crate::codec::{encode_message, FrameConfig};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes framed messages (and, for diagnostics, raw bytes) to any `Write`
/// stream.
pub struct MessageWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> MessageWriter<T> {
    /// Create a new message writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new message writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Frame `body` with a `Content-Length` header and send it (blocking).
    pub fn send(&mut self, body: &[u8]) -> Result<()> {
        if body.len() > self.config.max_content_length {
            return Err(FrameError::ContentTooLarge {
                size: body.len(),
                max: self.config.max_content_length,
            });
        }

        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        encode_message(body, &mut buf);
        let result = self.write_raw(&buf);
        self.buf = buf;
        result
    }

    /// Write bytes verbatim, without framing, then flush.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl MessageWriter<Stream> {
    /// Create a writer for a transport stream and apply its write timeout.
    pub fn with_config_stream(inner: Stream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}
