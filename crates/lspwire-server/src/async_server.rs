use std::future::Future;
use std::sync::Arc;

use bytes::BytesMut;
use futures_util::StreamExt;
use lspwire_frame::{encode_message, FrameError, MessageCodec};
use lspwire_transport::{AsyncListener, AsyncStream, Endpoint};
use tokio::io::AsyncWriteExt;
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

use crate::connection::{dispatch, Outgoing};
use crate::error::Result;
use crate::registry::HandlerRegistry;
use crate::server::ServerConfig;

/// Tokio flavor of [`Server`](crate::Server): one task per connection.
pub struct AsyncServer {
    listener: AsyncListener,
    registry: Arc<HandlerRegistry>,
    config: ServerConfig,
}

impl AsyncServer {
    /// Bind `endpoint`. Must be called inside a tokio runtime.
    pub async fn bind(endpoint: &Endpoint, registry: HandlerRegistry) -> Result<Self> {
        let listener = AsyncListener::bind(endpoint).await?;
        Ok(Self {
            listener,
            registry: Arc::new(registry),
            config: ServerConfig::default(),
        })
    }

    /// Override server config.
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn local_endpoint(&self) -> &Endpoint {
        self.listener.local_endpoint()
    }

    /// Accept one connection and serve it on a new task.
    pub async fn accept(&self) -> Result<tokio::task::JoinHandle<()>> {
        let stream = self.listener.accept().await?;
        let registry = Arc::clone(&self.registry);
        let config = self.config.clone();
        Ok(tokio::spawn(async move {
            if let Err(err) = handle_async_stream(stream, &registry, &config).await {
                warn!(error = %err, "connection failed");
            }
        }))
    }

    /// Accept connections until accepting fails.
    pub async fn serve(&self) -> Result<()> {
        loop {
            self.accept().await?;
        }
    }

    /// Accept connections until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(endpoint = %self.local_endpoint(), "server stopped accepting");
                    return Ok(());
                }
                accepted = self.accept() => {
                    accepted?;
                }
            }
        }
    }
}

/// Serve a single request on an async stream and close it.
pub async fn handle_async_stream(
    stream: AsyncStream,
    registry: &HandlerRegistry,
    config: &ServerConfig,
) -> Result<()> {
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut frames = FramedRead::new(read_half, MessageCodec::new(config.frame.clone()));

    let outgoing = match frames.next().await {
        Some(Ok(message)) => dispatch(registry, message),
        Some(Err(err)) => Outgoing::rejected(&err),
        None => {
            debug!("connection closed before a request arrived");
            Outgoing::rejected(&FrameError::headers_eof())
        }
    };

    match &outgoing {
        Outgoing::Framed(body) => {
            let mut wire = BytesMut::with_capacity(body.len() + 32);
            encode_message(body, &mut wire);
            write_half.write_all(&wire).await.map_err(FrameError::Io)?;
            debug!(bytes = body.len(), "sent response");
        }
        Outgoing::Raw(text) => {
            write_half
                .write_all(text.as_bytes())
                .await
                .map_err(FrameError::Io)?;
            debug!(diagnostic = %text, "sent diagnostic");
        }
        Outgoing::Nothing => debug!("closed without reply"),
    }
    write_half.shutdown().await.map_err(FrameError::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::io::AsyncReadExt;

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

    async fn roundtrip(endpoint: &Endpoint, wire: &[u8]) -> Vec<u8> {
        let mut stream = lspwire_transport::connect_async(endpoint).await.unwrap();
        stream.write_all(wire).await.unwrap();
        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).await.unwrap();
        reply
    }

    #[tokio::test]
    async fn async_request_gets_framed_reply() {
        let endpoint: Endpoint = "127.0.0.1:0".parse().unwrap();
        let server = Arc::new(AsyncServer::bind(&endpoint, ping_registry()).await.unwrap());
        let local = server.local_endpoint().clone();

        let serving = Arc::clone(&server);
        tokio::spawn(async move { serving.serve().await });

        let body = br#"{"jsonrpc":"2.0","id":"a","method":"ping"}"#;
        let mut wire = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
        wire.extend_from_slice(body);

        let reply = String::from_utf8(roundtrip(&local, &wire).await).unwrap();
        let expected = r#"{"jsonrpc":"2.0","id":"a","result":"pong"}"#;
        assert_eq!(
            reply,
            format!("Content-Length: {}\r\n\r\n{expected}", expected.len())
        );
    }

    #[tokio::test]
    async fn async_unknown_method_is_raw() {
        let endpoint: Endpoint = "127.0.0.1:0".parse().unwrap();
        let server = Arc::new(AsyncServer::bind(&endpoint, ping_registry()).await.unwrap());
        let local = server.local_endpoint().clone();

        let serving = Arc::clone(&server);
        tokio::spawn(async move { serving.serve().await });

        let body = br#"{"jsonrpc":"2.0","id":1,"method":"missing"}"#;
        let mut wire = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
        wire.extend_from_slice(body);
        assert_eq!(roundtrip(&local, &wire).await, b"invalid method");
    }

    #[tokio::test]
    async fn shutdown_future_stops_accepting() {
        let endpoint: Endpoint = "127.0.0.1:0".parse().unwrap();
        let server = AsyncServer::bind(&endpoint, ping_registry()).await.unwrap();
        server.serve_with_shutdown(async {}).await.unwrap();
    }
}
