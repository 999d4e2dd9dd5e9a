//! One-request-per-connection JSON-RPC serving.
//!
//! Register handlers in a [`HandlerRegistry`], hand it to a [`Server`] (or
//! [`AsyncServer`] with the `async` feature) and every accepted connection
//! gets exactly one request read, dispatched and answered before it is
//! closed. [`Client`] speaks the same pattern from the other side.

pub mod client;
pub mod connection;
pub mod error;
pub mod registry;
pub mod server;

#[cfg(feature = "async")]
pub mod async_server;

pub use client::{Client, Reply};
pub use connection::{dispatch, serve_connection, Outgoing, INVALID_METHOD};
pub use error::{Result, ServerError};
pub use registry::{Handler, HandlerRegistry};
pub use server::{handle_stream, Server, ServerConfig, ShutdownHandle};

#[cfg(feature = "async")]
pub use async_server::{handle_async_stream, AsyncServer};
