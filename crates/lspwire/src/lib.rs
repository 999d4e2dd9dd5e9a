//! Language-server style JSON-RPC over sockets.
//!
//! A server accepts a connection, reads one `Content-Length` framed request,
//! dispatches it by method name and answers (unless it was a notification)
//! before closing the connection.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP and Unix domain socket endpoints
//! - [`frame`]: `Content-Length` header framing
//! - [`jsonrpc`]: request/response envelopes, ids and error codes
//! - [`server`]: handler registry, servers and client (behind `server` feature)

/// Re-export transport types.
pub mod transport {
    pub use lspwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use lspwire_frame::*;
}

/// Re-export envelope types.
pub mod jsonrpc {
    pub use lspwire_jsonrpc::*;
}

/// Re-export server types (requires `server` feature).
#[cfg(feature = "server")]
pub mod server {
    pub use lspwire_server::*;
}
