/// Errors that can occur while framing or unframing messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A header line did not split into exactly `name: value`.
    #[error("malformed header")]
    MalformedHeader,

    /// The header block ended without a `Content-Length` entry.
    #[error("missing Content-Length header")]
    MissingContentLength,

    /// The `Content-Length` value is not a non-negative integer.
    #[error("invalid Content-Length header value")]
    InvalidContentLength { value: String },

    /// The declared body exceeds the configured maximum size.
    #[error("content too large ({size} bytes, max {max})")]
    ContentTooLarge { size: usize, max: usize },

    /// The header block grew past the fixed limit without terminating.
    #[error("header block exceeds {max} bytes")]
    HeaderTooLarge { max: usize },

    /// An I/O error occurred while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before the declared body was received.
    #[error("connection closed (incomplete message)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;

impl FrameError {
    /// The stream ended before the blank line closing the header block.
    pub fn headers_eof() -> Self {
        Self::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed while reading headers",
        ))
    }
}
