//! Byte-stream transports for lspwire.
//!
//! Provides one interface over the local and network transports a language
//! service is reachable on:
//! - TCP (`host:port`)
//! - Unix domain sockets (`unix:<path>`, Linux/macOS)
//!
//! This is the lowest layer of lspwire. Everything else builds on top of
//! the [`Stream`] type provided here.

pub mod endpoint;
pub mod error;
pub mod listener;
pub mod stream;
pub mod tcp;

#[cfg(unix)]
pub mod uds;

#[cfg(feature = "async")]
pub mod nonblocking;

pub use endpoint::Endpoint;
pub use error::{Result, TransportError};
pub use listener::{connect, Listener};
pub use stream::Stream;
pub use tcp::TcpTransport;

#[cfg(unix)]
pub use uds::UnixDomainSocket;

#[cfg(feature = "async")]
pub use nonblocking::{connect_async, AsyncListener, AsyncStream};
