/// Errors that can occur while decoding or encoding envelopes.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// An identifier was decoded from zero bytes.
    #[error("id cannot be empty")]
    EmptyId,

    /// The `jsonrpc` member is not `"2.0"`.
    #[error("invalid jsonrpc version")]
    InvalidVersion { found: String },

    /// A response envelope carried both `result` and `error`.
    #[error("response carries both result and error")]
    ResultAndError,

    /// The body is not valid JSON or does not match the envelope shape.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MessageError>;
