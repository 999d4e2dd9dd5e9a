use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use lspwire_frame::{FrameConfig, MessageReader, MessageWriter};
use lspwire_transport::{Endpoint, Listener, Stream};
use tracing::{debug, info, warn};

use crate::connection::{serve_connection, Outgoing};
use crate::error::{Result, ServerError};
use crate::registry::HandlerRegistry;

/// Server behavior configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Limits and timeouts applied to every accepted connection.
    pub frame: FrameConfig,
}

/// Accepts connections and serves one request on each.
///
/// Every accepted connection is handed to its own OS thread. The registry is
/// shared read-only between them.
pub struct Server {
    listener: Listener,
    registry: Arc<HandlerRegistry>,
    config: ServerConfig,
    next_connection_id: AtomicU64,
}

impl Server {
    /// Bind `endpoint` and take ownership of `registry`.
    pub fn bind(endpoint: &Endpoint, registry: HandlerRegistry) -> Result<Self> {
        let listener = Listener::bind(endpoint)?;
        Ok(Self::from_listener(listener, registry))
    }

    /// Serve on an already bound listener.
    pub fn from_listener(listener: Listener, registry: HandlerRegistry) -> Self {
        Self {
            listener,
            registry: Arc::new(registry),
            config: ServerConfig::default(),
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Override server config.
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// The endpoint actually bound (resolves TCP port 0).
    pub fn local_endpoint(&self) -> Endpoint {
        self.listener.local_endpoint()
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accept one connection and serve it on a new thread.
    pub fn accept(&self) -> Result<JoinHandle<()>> {
        let stream = self.listener.accept()?;
        self.spawn(stream)
    }

    /// Accept connections until accepting fails.
    pub fn serve(&self) -> Result<()> {
        loop {
            self.accept()?;
        }
    }

    /// Accept connections while `running` stays set.
    ///
    /// The flag is checked between accepts, so a blocked accept only notices
    /// it once the next connection arrives. [`shutdown_handle`] pairs the flag
    /// with a wake-up connection.
    ///
    /// [`shutdown_handle`]: Self::shutdown_handle
    pub fn serve_while(&self, running: &AtomicBool) -> Result<()> {
        while running.load(Ordering::SeqCst) {
            let stream = self.listener.accept()?;
            if !running.load(Ordering::SeqCst) {
                debug!("stop requested, dropping wake-up connection");
                break;
            }
            self.spawn(stream)?;
        }
        info!(endpoint = %self.local_endpoint(), "server stopped accepting");
        Ok(())
    }

    /// A handle that stops [`serve_while`](Self::serve_while) from any thread.
    pub fn shutdown_handle(&self, running: Arc<AtomicBool>) -> ShutdownHandle {
        ShutdownHandle {
            endpoint: wake_target(self.local_endpoint()),
            running,
        }
    }

    fn spawn(&self, stream: Stream) -> Result<JoinHandle<()>> {
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(&self.registry);
        let frame = self.config.frame.clone();
        debug!(connection_id, peer = %stream.peer_label(), "accepted connection");

        thread::Builder::new()
            .name(format!("lspwire-conn-{connection_id}"))
            .spawn(move || {
                if let Err(err) = handle_stream(stream, &registry, frame) {
                    warn!(connection_id, error = %err, "connection failed");
                }
            })
            .map_err(ServerError::Spawn)
    }
}

/// Serve a single request on `stream` and close it.
pub fn handle_stream(stream: Stream, registry: &HandlerRegistry, frame: FrameConfig) -> Result<()> {
    let reader_stream = stream.try_clone()?;
    let mut reader = MessageReader::with_config_stream(reader_stream, frame.clone())?;
    let mut writer = MessageWriter::with_config_stream(stream, frame)?;

    match serve_connection(&mut reader, &mut writer, registry)? {
        Outgoing::Framed(body) => debug!(bytes = body.len(), "sent response"),
        Outgoing::Raw(text) => debug!(diagnostic = %text, "sent diagnostic"),
        Outgoing::Nothing => debug!("closed without reply"),
    }
    Ok(())
}

/// Where to connect to reach a listener bound to `endpoint`.
///
/// A wildcard TCP bind is reached through loopback of the same family.
fn wake_target(endpoint: Endpoint) -> Endpoint {
    let Endpoint::Tcp(addr) = &endpoint else {
        return endpoint;
    };
    match addr.parse::<SocketAddr>() {
        Ok(mut socket) if socket.ip().is_unspecified() => {
            let loopback = match socket.ip() {
                IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
            };
            socket.set_ip(loopback);
            Endpoint::Tcp(socket.to_string())
        }
        _ => endpoint,
    }
}

/// Stops a server blocked in [`Server::serve_while`].
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    endpoint: Endpoint,
    running: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Clear the running flag and poke the listener awake.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        match lspwire_transport::connect(&self.endpoint) {
            Ok(_wake) => debug!("sent wake-up connection"),
            Err(err) => debug!(error = %err, "wake-up connect failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use serde_json::json;

    use super::*;

    fn ping_registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register("ping", |_req, resp| {
            if let Some(resp) = resp {
                resp.set_result(json!("pong"));
            }
        });
        registry
    }

    fn local_tcp() -> Endpoint {
        "127.0.0.1:0".parse().unwrap()
    }

    #[test]
    fn accept_serves_one_request() {
        let server = Server::bind(&local_tcp(), ping_registry()).unwrap();
        let endpoint = server.local_endpoint();

        let client = thread::spawn(move || {
            let mut stream = lspwire_transport::connect(&endpoint).unwrap();
            let body = br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
            write!(stream, "Content-Length: {}\r\n\r\n", body.len()).unwrap();
            stream.write_all(body).unwrap();
            let mut reply = String::new();
            stream.read_to_string(&mut reply).unwrap();
            reply
        });

        server.accept().unwrap().join().unwrap();
        let reply = client.join().unwrap();
        let expected = r#"{"jsonrpc":"2.0","id":1,"result":"pong"}"#;
        assert_eq!(
            reply,
            format!("Content-Length: {}\r\n\r\n{expected}", expected.len())
        );
    }

    #[test]
    fn serve_while_stops_after_shutdown() {
        let server = Server::bind(&local_tcp(), ping_registry()).unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let handle = server.shutdown_handle(Arc::clone(&running));

        let serving = thread::spawn(move || server.serve_while(&running));
        handle.shutdown();
        serving.join().unwrap().unwrap();
    }

    #[test]
    fn wildcard_bind_wakes_through_loopback() {
        let server = Server::bind(&"0.0.0.0:0".parse().unwrap(), ping_registry()).unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let handle = server.shutdown_handle(Arc::clone(&running));
        assert!(handle.endpoint.to_string().starts_with("127.0.0.1:"));

        let serving = thread::spawn(move || server.serve_while(&running));
        handle.shutdown();
        serving.join().unwrap().unwrap();
    }

    #[test]
    fn wake_target_rewrites_only_wildcards() {
        assert_eq!(
            wake_target(Endpoint::Tcp("[::]:4000".to_string())),
            Endpoint::Tcp("[::1]:4000".to_string())
        );
        assert_eq!(
            wake_target(Endpoint::Tcp("10.1.2.3:4000".to_string())),
            Endpoint::Tcp("10.1.2.3:4000".to_string())
        );
        assert_eq!(
            wake_target(Endpoint::Unix("/tmp/x.sock".into())),
            Endpoint::Unix("/tmp/x.sock".into())
        );
    }

    #[test]
    fn registry_is_frozen_behind_server() {
        let server = Server::bind(&local_tcp(), ping_registry()).unwrap();
        assert_eq!(server.registry().methods(), vec!["ping"]);
        assert!(server.config().frame.read_timeout.is_none());
    }
}
