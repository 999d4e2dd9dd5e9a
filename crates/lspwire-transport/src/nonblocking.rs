//! Tokio counterparts of [`Listener`](crate::Listener) and [`Stream`](crate::Stream).

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};
#[cfg(unix)]
use crate::uds::SocketFile;

/// An async connected stream.
#[derive(Debug)]
pub enum AsyncStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(tokio::net::UnixStream),
}

impl AsyncRead for AsyncStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            AsyncStream::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            #[cfg(unix)]
            AsyncStream::Unix(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for AsyncStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            AsyncStream::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            #[cfg(unix)]
            AsyncStream::Unix(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            AsyncStream::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            #[cfg(unix)]
            AsyncStream::Unix(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            AsyncStream::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            #[cfg(unix)]
            AsyncStream::Unix(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

enum AsyncListenerInner {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(tokio::net::UnixListener),
}

/// An async listener for any [`Endpoint`].
///
/// Unix socket files are removed when the listener is dropped, unless
/// another listener has replaced them since.
pub struct AsyncListener {
    inner: AsyncListenerInner,
    local: Endpoint,
    #[cfg(unix)]
    _socket_file: Option<SocketFile>,
}

impl AsyncListener {
    /// Bind the endpoint. Must be called inside a tokio runtime.
    pub async fn bind(endpoint: &Endpoint) -> Result<Self> {
        let bind_err = |source: io::Error| TransportError::Bind {
            endpoint: endpoint.to_string(),
            source,
        };

        match endpoint {
            Endpoint::Tcp(addr) => {
                let listener = TcpListener::bind(addr.as_str()).await.map_err(bind_err)?;
                let local_addr = listener.local_addr().map_err(bind_err)?;
                info!(%local_addr, "listening on tcp (async)");
                Ok(Self {
                    inner: AsyncListenerInner::Tcp(listener),
                    local: Endpoint::Tcp(local_addr.to_string()),
                    #[cfg(unix)]
                    _socket_file: None,
                })
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                use std::os::unix::fs::PermissionsExt;

                crate::uds::remove_stale_socket(path).map_err(bind_err)?;
                let listener = tokio::net::UnixListener::bind(path).map_err(bind_err)?;
                std::fs::set_permissions(
                    path,
                    std::fs::Permissions::from_mode(crate::UnixDomainSocket::DEFAULT_SOCKET_MODE),
                )
                .map_err(bind_err)?;
                let socket_file = SocketFile::record(path.clone()).map_err(bind_err)?;
                info!(?path, "listening on unix domain socket (async)");
                Ok(Self {
                    inner: AsyncListenerInner::Unix(listener),
                    local: endpoint.clone(),
                    _socket_file: Some(socket_file),
                })
            }
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(TransportError::Unsupported(endpoint.to_string())),
        }
    }

    /// Accept the next connection.
    pub async fn accept(&self) -> Result<AsyncStream> {
        match &self.inner {
            AsyncListenerInner::Tcp(listener) => {
                let (stream, peer) = listener.accept().await.map_err(TransportError::Accept)?;
                debug!(%peer, "accepted tcp connection (async)");
                Ok(AsyncStream::Tcp(stream))
            }
            #[cfg(unix)]
            AsyncListenerInner::Unix(listener) => {
                let (stream, _addr) = listener.accept().await.map_err(TransportError::Accept)?;
                debug!("accepted unix connection (async)");
                Ok(AsyncStream::Unix(stream))
            }
        }
    }

    /// The endpoint actually bound.
    pub fn local_endpoint(&self) -> &Endpoint {
        &self.local
    }
}

/// Connect to an endpoint asynchronously.
pub async fn connect_async(endpoint: &Endpoint) -> Result<AsyncStream> {
    let connect_err = |source: io::Error| TransportError::Connect {
        endpoint: endpoint.to_string(),
        source,
    };
    match endpoint {
        Endpoint::Tcp(addr) => TcpStream::connect(addr.as_str())
            .await
            .map(AsyncStream::Tcp)
            .map_err(connect_err),
        #[cfg(unix)]
        Endpoint::Unix(path) => tokio::net::UnixStream::connect(path)
            .await
            .map(AsyncStream::Unix)
            .map_err(connect_err),
        #[cfg(not(unix))]
        Endpoint::Unix(_) => Err(TransportError::Unsupported(endpoint.to_string())),
    }
}
