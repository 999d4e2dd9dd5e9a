/// Errors that can occur while serving or calling.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] lspwire_transport::TransportError),

    /// Framing error.
    #[error("frame error: {0}")]
    Frame(#[from] lspwire_frame::FrameError),

    /// Envelope decode/encode error.
    #[error("message error: {0}")]
    Message(#[from] lspwire_jsonrpc::MessageError),

    /// A connection worker could not be started.
    #[error("failed to spawn connection worker: {0}")]
    Spawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
