use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{MessageError, Result};
use crate::error_code::ResponseError;
use crate::id::Id;
use crate::request::JSONRPC_VERSION;

/// A response envelope.
///
/// Starts out as a `null` result for the given id. A handler fills it in with
/// [`set_result`](Self::set_result) or [`set_error`](Self::set_error). Once an
/// error is set the result is never serialized: the wire form carries
/// `jsonrpc`, `id` and then exactly one of `result` / `error`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireResponse")]
pub struct ResponseMessage {
    id: Id,
    result: Value,
    error: Option<ResponseError>,
}

impl ResponseMessage {
    /// An empty response answering the request identified by `id`.
    pub fn new(id: Id) -> Self {
        Self {
            id,
            result: Value::Null,
            error: None,
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn set_result(&mut self, result: Value) {
        self.result = result;
    }

    /// Serialize `result` and store it.
    pub fn set_result_from<T: Serialize>(&mut self, result: &T) -> Result<()> {
        self.result = serde_json::to_value(result)?;
        Ok(())
    }

    /// Mark the response as failed. Any result is discarded.
    pub fn set_error(&mut self, error: ResponseError) {
        self.result = Value::Null;
        self.error = Some(error);
    }

    /// Drop the result value.
    pub fn clear_result(&mut self) {
        self.result = Value::Null;
    }

    /// The result, unless an error has been set.
    pub fn result(&self) -> Option<&Value> {
        match self.error {
            Some(_) => None,
            None => Some(&self.result),
        }
    }

    pub fn error(&self) -> Option<&ResponseError> {
        self.error.as_ref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Serialize as a message body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a response body.
    pub fn decode(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Split into the id and either the result or the error.
    pub fn into_parts(self) -> (Id, std::result::Result<Value, ResponseError>) {
        match self.error {
            Some(error) => (self.id, Err(error)),
            None => (self.id, Ok(self.result)),
        }
    }
}

impl Serialize for ResponseMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResponseMessage", 3)?;
        state.serialize_field("jsonrpc", JSONRPC_VERSION)?;
        state.serialize_field("id", &self.id)?;
        match &self.error {
            Some(error) => state.serialize_field("error", error)?,
            None => state.serialize_field("result", &self.result)?,
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct WireResponse {
    jsonrpc: String,
    id: Id,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ResponseError>,
}

impl TryFrom<WireResponse> for ResponseMessage {
    type Error = MessageError;

    fn try_from(wire: WireResponse) -> Result<Self> {
        if wire.jsonrpc != JSONRPC_VERSION {
            return Err(MessageError::InvalidVersion {
                found: wire.jsonrpc,
            });
        }
        match (wire.result, wire.error) {
            (Some(_), Some(_)) => Err(MessageError::ResultAndError),
            (result, error) => Ok(Self {
                id: wire.id,
                result: result.unwrap_or(Value::Null),
                error,
            }),
        }
    }
}
