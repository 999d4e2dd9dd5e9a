use std::io::{Read, Write};

use lspwire_frame::{FrameError, Message, MessageReader, MessageWriter};
use lspwire_jsonrpc::{Request, ResponseMessage};
use tracing::{debug, warn};

use crate::error::Result;
use crate::registry::HandlerRegistry;

/// Reply text for a method with no registered handler.
pub const INVALID_METHOD: &str = "invalid method";

/// What a connection writes back after one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// An encoded response body, sent framed.
    Framed(Vec<u8>),
    /// Diagnostic text, sent as-is without a header block.
    Raw(String),
    /// Nothing: a notification, or a stream that ended inside the body.
    Nothing,
}

impl Outgoing {
    /// The reply for a message that could not be read.
    ///
    /// A stream that ended after a complete header block but short of the
    /// declared body gets nothing back. Every other failure, including EOF
    /// inside the header block, is reported as its display text.
    pub fn rejected(err: &FrameError) -> Self {
        warn!(error = %err, "failed to read request");
        if is_truncated(err) {
            return Self::Nothing;
        }
        Self::Raw(err.to_string())
    }
}

fn is_truncated(err: &FrameError) -> bool {
    matches!(err, FrameError::ConnectionClosed)
}

/// Decode one framed message and run it through `registry`.
pub fn dispatch(registry: &HandlerRegistry, message: Message) -> Outgoing {
    let request = match Request::from_message(message) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "failed to decode request");
            return Outgoing::Raw(err.to_string());
        }
    };

    let Some(handler) = registry.get(request.method()) else {
        warn!(method = request.method(), "no handler registered");
        return Outgoing::Raw(INVALID_METHOD.to_string());
    };

    let Some(id) = request.id().cloned() else {
        debug!(method = request.method(), "dispatching notification");
        handler.handle(&request, None);
        return Outgoing::Nothing;
    };

    debug!(method = request.method(), %id, "dispatching request");
    let mut response = ResponseMessage::new(id);
    handler.handle(&request, Some(&mut response));
    if response.is_error() {
        response.clear_result();
    }

    match response.encode() {
        Ok(body) => Outgoing::Framed(body),
        Err(err) => {
            warn!(method = request.method(), error = %err, "failed to encode response");
            Outgoing::Raw(err.to_string())
        }
    }
}

/// Serve one request on an established connection.
///
/// Reads a single message, dispatches it and writes whatever it produced.
/// Read and decode failures are reported to the peer, not to the caller; the
/// returned error only covers writing the reply.
pub fn serve_connection<R: Read, W: Write>(
    reader: &mut MessageReader<R>,
    writer: &mut MessageWriter<W>,
    registry: &HandlerRegistry,
) -> Result<Outgoing> {
    let outgoing = match reader.read_message() {
        Ok(message) => dispatch(registry, message),
        Err(err) => Outgoing::rejected(&err),
    };

    match &outgoing {
        Outgoing::Framed(body) => writer.send(body)?,
        Outgoing::Raw(text) => writer.write_raw(text.as_bytes())?,
        Outgoing::Nothing => {}
    }
    Ok(outgoing)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use lspwire_jsonrpc::{ErrorCode, ResponseError};
    use serde_json::{json, Value};

    use super::*;

    fn frame(body: &[u8]) -> Vec<u8> {
        let mut wire = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
        wire.extend_from_slice(body);
        wire
    }

    fn run(registry: &HandlerRegistry, wire: Vec<u8>) -> (Outgoing, Vec<u8>) {
        let mut reader = MessageReader::new(Cursor::new(wire));
        let mut writer = MessageWriter::new(Vec::new());
        let outgoing = serve_connection(&mut reader, &mut writer, registry).unwrap();
        (outgoing, writer.into_inner())
    }

    fn hover_registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register("textDocument/hover", |_req, resp| {
            if let Some(resp) = resp {
                resp.set_result(json!({"contents": "hi"}));
            }
        });
        registry
    }

    #[test]
    fn request_gets_framed_result() {
        let body = br#"{"jsonrpc":"2.0","id":1,"method":"textDocument/hover"}"#;
        let (outgoing, written) = run(&hover_registry(), frame(body));

        let expected = br#"{"jsonrpc":"2.0","id":1,"result":{"contents":"hi"}}"#;
        assert_eq!(outgoing, Outgoing::Framed(expected.to_vec()));
        assert_eq!(written, frame(expected));
    }

    #[test]
    fn string_id_echoed_as_string() {
        let body = br#"{"jsonrpc":"2.0","id":"abc","method":"textDocument/hover"}"#;
        let (_, written) = run(&hover_registry(), frame(body));
        let text = String::from_utf8(written).unwrap();
        assert!(text.contains(r#""id":"abc""#));
    }

    #[test]
    fn notification_writes_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut registry = HandlerRegistry::new();
        registry.register("initialized", move |_req, resp| {
            assert!(resp.is_none());
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let body = br#"{"jsonrpc":"2.0","method":"initialized"}"#;
        let (outgoing, written) = run(&registry, frame(body));
        assert_eq!(outgoing, Outgoing::Nothing);
        assert!(written.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_method_is_raw_text() {
        let body = br#"{"jsonrpc":"2.0","id":9,"method":"nope"}"#;
        let (outgoing, written) = run(&hover_registry(), frame(body));
        assert_eq!(outgoing, Outgoing::Raw(INVALID_METHOD.to_string()));
        assert_eq!(written, b"invalid method");
    }

    #[test]
    fn unknown_notification_is_also_rejected() {
        let body = br#"{"jsonrpc":"2.0","method":"nope"}"#;
        let (_, written) = run(&hover_registry(), frame(body));
        assert_eq!(written, b"invalid method");
    }

    #[test]
    fn wrong_version_never_reaches_handler() {
        let mut registry = HandlerRegistry::new();
        registry.register("textDocument/hover", |_req, _resp| {
            panic!("handler must not run");
        });

        let body = br#"{"jsonrpc":"1.0","id":1,"method":"textDocument/hover"}"#;
        let (_, written) = run(&registry, frame(body));
        assert_eq!(written, b"invalid jsonrpc version");
    }

    #[test]
    fn missing_content_length_reported_raw() {
        let (_, written) = run(&hover_registry(), b"Content-Type: text\r\n\r\n{}".to_vec());
        assert_eq!(written, b"missing Content-Length header");
    }

    #[test]
    fn malformed_header_reported_raw() {
        let (_, written) = run(&hover_registry(), b"Content-Length:5\r\n\r\nhello".to_vec());
        assert_eq!(written, b"malformed header");
    }

    #[test]
    fn short_body_writes_nothing() {
        let (outgoing, written) = run(&hover_registry(), b"Content-Length: 5\r\n\r\nabc".to_vec());
        assert_eq!(outgoing, Outgoing::Nothing);
        assert!(written.is_empty());
    }

    #[test]
    fn eof_inside_headers_reported_raw() {
        let (outgoing, written) = run(&hover_registry(), b"Content-Length: 5\r\n".to_vec());
        let expected = FrameError::headers_eof().to_string();
        assert_eq!(outgoing, Outgoing::Raw(expected.clone()));
        assert_eq!(written, expected.as_bytes());
    }

    #[test]
    fn empty_stream_reported_raw() {
        let (outgoing, written) = run(&hover_registry(), Vec::new());
        assert_eq!(outgoing, Outgoing::Raw(FrameError::headers_eof().to_string()));
        assert_eq!(written, b"I/O error: connection closed while reading headers");
    }

    #[test]
    fn unterminated_header_line_reported_raw() {
        let (_, written) = run(&hover_registry(), vec![b'a'; 64 * 1024]);
        assert_eq!(written, b"header block exceeds 8192 bytes");
    }

    #[test]
    fn invalid_length_reported_raw() {
        let (_, written) = run(&hover_registry(), b"Content-Length: abc\r\n\r\n".to_vec());
        assert_eq!(written, b"invalid Content-Length header value");
    }

    #[test]
    fn handler_error_suppresses_result() {
        let mut registry = HandlerRegistry::new();
        registry.register("fail", |_req, resp| {
            if let Some(resp) = resp {
                resp.set_result(json!("ignored"));
                resp.set_error(ResponseError::from_code(ErrorCode::METHOD_NOT_FOUND));
            }
        });

        let body = br#"{"jsonrpc":"2.0","id":1,"method":"fail"}"#;
        let (outgoing, _) = run(&registry, frame(body));
        let Outgoing::Framed(body) = outgoing else {
            panic!("expected a framed reply");
        };
        assert_eq!(
            body,
            br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#
        );
    }

    #[test]
    fn handler_sees_headers_and_params() {
        let mut registry = HandlerRegistry::new();
        registry.register("echo", |req, resp| {
            assert!(req.headers().get("content-length").is_some());
            if let Some(resp) = resp {
                let params: Value = req.params().unwrap();
                resp.set_result(params);
            }
        });

        let body = br#"{"jsonrpc":"2.0","id":2,"method":"echo","params":[1,"two"]}"#;
        let (outgoing, _) = run(&registry, frame(body));
        assert_eq!(
            outgoing,
            Outgoing::Framed(br#"{"jsonrpc":"2.0","id":2,"result":[1,"two"]}"#.to_vec())
        );
    }

    #[test]
    fn only_first_message_is_served() {
        let mut wire = frame(br#"{"jsonrpc":"2.0","id":1,"method":"textDocument/hover"}"#);
        wire.extend(frame(br#"{"jsonrpc":"2.0","id":2,"method":"textDocument/hover"}"#));
        let (_, written) = run(&hover_registry(), wire);
        let text = String::from_utf8(written).unwrap();
        assert!(text.contains(r#""id":1"#));
        assert!(!text.contains(r#""id":2"#));
    }
}
