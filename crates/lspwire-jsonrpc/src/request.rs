use lspwire_frame::{Headers, Message};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use tracing::trace;

use crate::error::{MessageError, Result};
use crate::id::Id;

/// The only protocol version accepted or produced.
pub const JSONRPC_VERSION: &str = "2.0";

/// A request or notification envelope as it appears on the wire.
///
/// `params` is kept as raw JSON; handlers decode it into whatever shape their
/// method expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMessage {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Box<RawValue>>,
}

impl RequestMessage {
    /// A request that expects a response.
    pub fn request(id: impl Into<Id>, method: impl Into<String>, params: Option<Box<RawValue>>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    /// A notification: no id, never answered.
    pub fn notification(method: impl Into<String>, params: Option<Box<RawValue>>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Serialize as a message body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a body and check the protocol version.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let message: RequestMessage = serde_json::from_slice(body)?;
        if message.jsonrpc != JSONRPC_VERSION {
            return Err(MessageError::InvalidVersion {
                found: message.jsonrpc,
            });
        }
        Ok(message)
    }
}

/// Serialize any value into a raw `params` payload.
pub fn to_params<T: Serialize>(value: &T) -> Result<Box<RawValue>> {
    Ok(serde_json::value::to_raw_value(value)?)
}

/// A decoded inbound request together with the headers it arrived with.
#[derive(Debug, Clone)]
pub struct Request {
    headers: Headers,
    message: RequestMessage,
}

impl Request {
    /// Decode a request body received under `headers`.
    pub fn decode(headers: Headers, body: &[u8]) -> Result<Self> {
        let message = RequestMessage::decode(body)?;
        trace!(
            method = %message.method,
            id = ?message.id,
            "decoded request envelope"
        );
        Ok(Self { headers, message })
    }

    /// Decode a framed message.
    pub fn from_message(message: Message) -> Result<Self> {
        Self::decode(message.headers, message.body.as_ref())
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn id(&self) -> Option<&Id> {
        self.message.id.as_ref()
    }

    pub fn method(&self) -> &str {
        &self.message.method
    }

    pub fn is_notification(&self) -> bool {
        self.message.is_notification()
    }

    /// The raw `params` JSON, if any was sent.
    pub fn raw_params(&self) -> Option<&RawValue> {
        self.message.params.as_deref()
    }

    /// Decode `params` into `T`. Absent params decode from `null`.
    pub fn params<T: DeserializeOwned>(&self) -> Result<T> {
        let raw = self.raw_params().map_or("null", RawValue::get);
        Ok(serde_json::from_str(raw)?)
    }

    pub fn message(&self) -> &RequestMessage {
        &self.message
    }

    pub fn into_message(self) -> RequestMessage {
        self.message
    }
}
