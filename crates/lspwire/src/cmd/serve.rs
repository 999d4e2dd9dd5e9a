use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use lspwire_frame::FrameConfig;
use lspwire_jsonrpc::{ErrorCode, Request, ResponseError, ResponseMessage};
use lspwire_server::{HandlerRegistry, Server, ServerConfig};
use lspwire_transport::Endpoint;
use serde_json::{json, Value};

use crate::cmd::{parse_duration, parse_endpoint, ServeArgs};
use crate::exit::{server_error, CliError, CliResult, INTERNAL, SUCCESS};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let endpoint = parse_endpoint(&args.endpoint)?;
    let config = server_config(&args)?;
    if args.use_async {
        return run_async(endpoint, config);
    }

    let server = Server::bind(&endpoint, builtin_registry())
        .map_err(|err| server_error("bind failed", err))?
        .with_config(config);

    let running = Arc::new(AtomicBool::new(true));
    let handle = server.shutdown_handle(Arc::clone(&running));
    install_ctrlc_handler(move || handle.shutdown())?;

    tracing::info!(
        endpoint = %server.local_endpoint(),
        methods = ?server.registry().methods(),
        "serving"
    );
    server
        .serve_while(&running)
        .map_err(|err| server_error("accept failed", err))?;

    Ok(SUCCESS)
}

#[cfg(feature = "async")]
fn run_async(endpoint: Endpoint, config: ServerConfig) -> CliResult<i32> {
    use lspwire_server::AsyncServer;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| crate::exit::io_error("runtime setup failed", err))?;

    let stop = Arc::new(tokio::sync::Notify::new());
    let notifier = Arc::clone(&stop);
    install_ctrlc_handler(move || notifier.notify_one())?;

    runtime
        .block_on(async {
            let server = AsyncServer::bind(&endpoint, builtin_registry())
                .await?
                .with_config(config);
            tracing::info!(endpoint = %server.local_endpoint(), "serving (async)");
            server.serve_with_shutdown(stop.notified()).await
        })
        .map_err(|err| server_error("async server failed", err))?;

    Ok(SUCCESS)
}

#[cfg(not(feature = "async"))]
fn run_async(_endpoint: Endpoint, _config: ServerConfig) -> CliResult<i32> {
    Err(CliError::usage(
        "--async requires a build with the `async` feature",
    ))
}

fn server_config(args: &ServeArgs) -> CliResult<ServerConfig> {
    let mut frame = FrameConfig::default();
    if let Some(timeout) = &args.read_timeout {
        frame.read_timeout = Some(parse_duration(timeout)?);
    }
    if let Some(max) = args.max_content_length {
        frame.max_content_length = max;
    }
    Ok(ServerConfig { frame })
}

/// Handlers served by `lspwire serve`.
pub fn builtin_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register("ping", ping)
        .register("echo", echo)
        .register("exit", exit);
    registry
}

fn ping(_request: &Request, response: Option<&mut ResponseMessage>) {
    if let Some(response) = response {
        response.set_result(json!("pong"));
    }
}

fn echo(request: &Request, response: Option<&mut ResponseMessage>) {
    let Some(response) = response else { return };
    match request.params::<Value>() {
        Ok(params) => response.set_result(params),
        Err(err) => response.set_error(ResponseError::new(
            ErrorCode::INVALID_PARAMS,
            err.to_string(),
            None,
        )),
    }
}

fn exit(request: &Request, _response: Option<&mut ResponseMessage>) {
    tracing::info!(notification = request.is_notification(), "exit received");
}

fn install_ctrlc_handler<F>(on_signal: F) -> CliResult<()>
where
    F: Fn() + Send + 'static,
{
    ctrlc::set_handler(move || {
        tracing::info!("interrupt received, shutting down");
        on_signal();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use lspwire_frame::{MessageReader, MessageWriter};
    use lspwire_server::serve_connection;

    use super::*;

    fn serve(body: &str) -> String {
        let wire = format!("Content-Length: {}\r\n\r\n{body}", body.len());
        let mut reader = MessageReader::new(Cursor::new(wire.into_bytes()));
        let mut writer = MessageWriter::new(Vec::new());
        serve_connection(&mut reader, &mut writer, &builtin_registry()).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn ping_answers_pong() {
        let reply = serve(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
        assert!(reply.ends_with(r#"{"jsonrpc":"2.0","id":1,"result":"pong"}"#));
    }

    #[test]
    fn echo_returns_params() {
        let reply = serve(r#"{"jsonrpc":"2.0","id":"e","method":"echo","params":{"k":[1,2]}}"#);
        assert!(reply.ends_with(r#"{"jsonrpc":"2.0","id":"e","result":{"k":[1,2]}}"#));
    }

    #[test]
    fn echo_without_params_is_null() {
        let reply = serve(r#"{"jsonrpc":"2.0","id":2,"method":"echo"}"#);
        assert!(reply.ends_with(r#"{"jsonrpc":"2.0","id":2,"result":null}"#));
    }

    #[test]
    fn exit_notification_is_silent() {
        assert_eq!(serve(r#"{"jsonrpc":"2.0","method":"exit"}"#), "");
    }

    #[test]
    fn config_from_flags() {
        let args = ServeArgs {
            endpoint: "127.0.0.1:0".to_string(),
            use_async: false,
            read_timeout: Some("250ms".to_string()),
            max_content_length: Some(1024),
        };
        let config = server_config(&args).unwrap();
        assert_eq!(
            config.frame.read_timeout,
            Some(std::time::Duration::from_millis(250))
        );
        assert_eq!(config.frame.max_content_length, 1024);
    }
}
