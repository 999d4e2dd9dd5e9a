use crate::endpoint::Endpoint;
use crate::error::Result;
#[cfg(not(unix))]
use crate::error::TransportError;
use crate::stream::Stream;
use crate::tcp::TcpTransport;
#[cfg(unix)]
use crate::uds::UnixDomainSocket;

/// A bound listener for any [`Endpoint`].
pub enum Listener {
    Tcp(TcpTransport),
    #[cfg(unix)]
    Unix(UnixDomainSocket),
}

impl Listener {
    /// Bind the endpoint.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        match endpoint {
            Endpoint::Tcp(addr) => TcpTransport::bind(addr).map(Listener::Tcp),
            #[cfg(unix)]
            Endpoint::Unix(path) => UnixDomainSocket::bind(path).map(Listener::Unix),
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(TransportError::Unsupported(endpoint.to_string())),
        }
    }

    /// Accept the next connection (blocking).
    pub fn accept(&self) -> Result<Stream> {
        match self {
            Listener::Tcp(tcp) => tcp.accept(),
            #[cfg(unix)]
            Listener::Unix(uds) => uds.accept(),
        }
    }

    /// The endpoint actually bound (with the real port for `:0` binds).
    pub fn local_endpoint(&self) -> Endpoint {
        match self {
            Listener::Tcp(tcp) => Endpoint::Tcp(tcp.local_addr().to_string()),
            #[cfg(unix)]
            Listener::Unix(uds) => Endpoint::Unix(uds.path().to_path_buf()),
        }
    }
}

/// Connect to an endpoint (blocking).
pub fn connect(endpoint: &Endpoint) -> Result<Stream> {
    match endpoint {
        Endpoint::Tcp(addr) => TcpTransport::connect(addr),
        #[cfg(unix)]
        Endpoint::Unix(path) => UnixDomainSocket::connect(path),
        #[cfg(not(unix))]
        Endpoint::Unix(_) => Err(TransportError::Unsupported(endpoint.to_string())),
    }
}
