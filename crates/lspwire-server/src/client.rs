use std::io::{Read, Write};
use std::net::Shutdown;

use bytes::BytesMut;
use lspwire_frame::{decode_message, encode_message, FrameConfig};
use lspwire_jsonrpc::{Id, RequestMessage, ResponseMessage};
use lspwire_transport::{Endpoint, TransportError};
use serde_json::value::RawValue;
use tracing::debug;

use crate::error::Result;

/// What a server sent back on one connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A framed response envelope.
    Response(ResponseMessage),
    /// Unframed diagnostic text, e.g. `invalid method`.
    Diagnostic(String),
    /// The server closed without writing anything.
    Empty,
}

impl Reply {
    fn parse(mut bytes: BytesMut, max_content_length: usize) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Self::Empty);
        }
        let raw = bytes.clone();
        match decode_message(&mut bytes, max_content_length) {
            Ok(Some(message)) => Ok(Self::Response(ResponseMessage::decode(&message.body)?)),
            Ok(None) | Err(_) => Ok(Self::Diagnostic(String::from_utf8_lossy(&raw).into_owned())),
        }
    }
}

/// Opens one connection per call, as the server expects.
#[derive(Debug, Clone)]
pub struct Client {
    endpoint: Endpoint,
    config: FrameConfig,
}

impl Client {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            config: FrameConfig::default(),
        }
    }

    /// Override frame limits and timeouts.
    pub fn with_config(mut self, config: FrameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send a request and wait for the reply.
    pub fn call(
        &self,
        method: &str,
        id: impl Into<Id>,
        params: Option<Box<RawValue>>,
    ) -> Result<Reply> {
        self.send(&RequestMessage::request(id, method, params))
    }

    /// Send a notification and wait for the server to hang up.
    ///
    /// A well-behaved server answers with [`Reply::Empty`].
    pub fn notify(&self, method: &str, params: Option<Box<RawValue>>) -> Result<Reply> {
        self.send(&RequestMessage::notification(method, params))
    }

    /// Send any envelope on a fresh connection and read until it closes.
    pub fn send(&self, message: &RequestMessage) -> Result<Reply> {
        let body = message.encode()?;
        let mut wire = BytesMut::with_capacity(body.len() + 32);
        encode_message(&body, &mut wire);

        let mut stream = lspwire_transport::connect(&self.endpoint)?;
        stream.set_read_timeout(self.config.read_timeout)?;
        stream.set_write_timeout(self.config.write_timeout)?;
        stream.write_all(&wire).map_err(TransportError::from)?;
        stream.flush().map_err(TransportError::from)?;
        stream.shutdown(Shutdown::Write)?;
        debug!(
            endpoint = %self.endpoint,
            method = %message.method,
            bytes = wire.len(),
            "sent request"
        );

        let mut received = Vec::new();
        stream
            .read_to_end(&mut received)
            .map_err(TransportError::from)?;
        Reply::parse(BytesMut::from(&received[..]), self.config.max_content_length)
    }
}
