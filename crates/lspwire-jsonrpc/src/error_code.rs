use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-RPC error code.
///
/// Codes from -32768 to -32000 are reserved. The named constants below carry
/// canonical text; any other value is accepted but has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    pub const PARSE_ERROR: Self = Self(-32700);
    pub const INVALID_REQUEST: Self = Self(-32600);
    pub const METHOD_NOT_FOUND: Self = Self(-32601);
    pub const INVALID_PARAMS: Self = Self(-32602);
    pub const INTERNAL_ERROR: Self = Self(-32603);
    pub const SERVER_ERROR_START: Self = Self(-32099);
    pub const SERVER_ERROR_END: Self = Self(-32000);
    pub const SERVER_NOT_INITIALIZED: Self = Self(-32002);
    pub const UNKNOWN_ERROR_CODE: Self = Self(-32001);
    pub const REQUEST_CANCELLED: Self = Self(-32800);
    pub const CONTENT_MODIFIED: Self = Self(-32801);

    pub fn code(self) -> i32 {
        self.0
    }

    /// Canonical text for a reserved code, empty for anything else.
    pub fn canonical_message(self) -> &'static str {
        match self {
            Self::PARSE_ERROR => "parse error",
            Self::INVALID_REQUEST => "invalid request",
            Self::METHOD_NOT_FOUND => "method not found",
            Self::INVALID_PARAMS => "invalid params",
            Self::INTERNAL_ERROR => "internal error",
            Self::SERVER_ERROR_START => "server error start",
            Self::SERVER_ERROR_END => "server error end",
            Self::SERVER_NOT_INITIALIZED => "server not initialized",
            Self::UNKNOWN_ERROR_CODE => "unknown error code",
            Self::REQUEST_CANCELLED => "request cancelled",
            Self::CONTENT_MODIFIED => "content modified",
            _ => "",
        }
    }

    /// Whether the code lies in the implementation-defined server range.
    pub fn is_server_error(self) -> bool {
        (Self::SERVER_ERROR_START.0..=Self::SERVER_ERROR_END.0).contains(&self.0)
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `error` member of a response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseError {
    /// Build an error; an empty `message` falls back to the code's
    /// canonical text.
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>, data: Option<Value>) -> Self {
        let code = code.into();
        let mut message = message.into();
        if message.is_empty() {
            message = code.canonical_message().to_string();
        }
        Self {
            code,
            message,
            data,
        }
    }

    /// Build an error carrying only the code's canonical text.
    pub fn from_code(code: impl Into<ErrorCode>) -> Self {
        Self::new(code, "", None)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for ResponseError {}
