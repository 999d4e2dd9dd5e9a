use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// A connected byte stream: implements Read + Write.
///
/// Returned by every accept and connect operation regardless of the
/// underlying transport.
pub struct Stream {
    inner: StreamInner,
}

enum StreamInner {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl Stream {
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: StreamInner::Tcp(stream),
        }
    }

    #[cfg(unix)]
    pub(crate) fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: StreamInner::Unix(stream),
        }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Shut down the read half, write half, or both.
    ///
    /// Clients use `Shutdown::Write` to signal end of input while still
    /// waiting for the reply.
    pub fn shutdown(&self, how: Shutdown) -> Result<()> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.shutdown(how).map_err(Into::into),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.shutdown(how).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            StreamInner::Tcp(stream) => Ok(Self::from_tcp(stream.try_clone()?)),
            #[cfg(unix)]
            StreamInner::Unix(stream) => Ok(Self::from_unix(stream.try_clone()?)),
        }
    }

    /// Description of the remote side, for logging.
    pub fn peer_label(&self) -> String {
        match &self.inner {
            StreamInner::Tcp(stream) => stream
                .peer_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "tcp:unknown".to_string()),
            #[cfg(unix)]
            StreamInner::Unix(_) => "unix-peer".to_string(),
        }
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.inner {
            StreamInner::Tcp(_) => "tcp",
            #[cfg(unix)]
            StreamInner::Unix(_) => "unix",
        };
        f.debug_struct("Stream").field("type", &kind).finish()
    }
}
