use std::fmt;
use std::io;

use lspwire_frame::FrameError;
use lspwire_jsonrpc::MessageError;
use lspwire_server::ServerError;
use lspwire_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::NotFound
        | io::ErrorKind::AddrInUse
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::PermissionDenied => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        TransportError::InvalidEndpoint(_) => CliError::usage(format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn message_error(context: &str, err: MessageError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn server_error(context: &str, err: ServerError) -> CliError {
    match err {
        ServerError::Transport(err) => transport_error(context, err),
        ServerError::Frame(err) => frame_error(context, err),
        ServerError::Message(err) => message_error(context, err),
        ServerError::Spawn(err) => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_connect_is_transport_failure() {
        let err = TransportError::Connect {
            endpoint: "127.0.0.1:1".to_string(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        let cli = server_error("connect failed", ServerError::Transport(err));
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.starts_with("connect failed: "));
    }

    #[test]
    fn read_timeout_maps_to_timeout() {
        let err = FrameError::Io(io::Error::from(io::ErrorKind::WouldBlock));
        assert_eq!(server_error("call", ServerError::Frame(err)).code, TIMEOUT);
    }

    #[test]
    fn bad_endpoint_is_usage() {
        let err = TransportError::InvalidEndpoint("nope".to_string());
        assert_eq!(transport_error("endpoint", err).code, USAGE);
    }

    #[test]
    fn undecodable_reply_is_invalid_data() {
        let err = MessageError::EmptyId;
        assert_eq!(
            server_error("reply", ServerError::Message(err)).code,
            DATA_INVALID
        );
    }
}
