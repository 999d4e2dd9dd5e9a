use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::Stream;

/// TCP transport.
///
/// Binding to port `0` picks an ephemeral port; use [`TcpTransport::local_addr`]
/// to find out which one.
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on a `host:port` address.
    pub fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            endpoint: addr.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            endpoint: addr.to_string(),
            source: e,
        })?;

        info!(%local_addr, "listening on tcp");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<Stream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted tcp connection");
        Ok(Stream::from_tcp(stream))
    }

    /// Connect to a listening TCP address (blocking).
    pub fn connect(addr: &str) -> Result<Stream> {
        let stream = TcpStream::connect(addr).map_err(|e| TransportError::Connect {
            endpoint: addr.to_string(),
            source: e,
        })?;
        debug!(addr, "connected over tcp");
        Ok(Stream::from_tcp(stream))
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
