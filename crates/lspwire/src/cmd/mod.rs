use std::time::Duration;

use clap::{Args, Subcommand};
use lspwire_transport::Endpoint;

use crate::exit::{transport_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the built-in ping, echo and exit methods.
    Serve(ServeArgs),
    /// Send one request or notification and print the reply.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Endpoint to bind: `host:port` or `unix:<path>`.
    pub endpoint: String,
    /// Serve connections as tokio tasks instead of OS threads.
    #[arg(long = "async")]
    pub use_async: bool,
    /// Per-connection read timeout (e.g. 5s, 500ms). Default: none.
    #[arg(long, value_name = "DURATION")]
    pub read_timeout: Option<String>,
    /// Largest accepted Content-Length in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_content_length: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Endpoint to connect to: `host:port` or `unix:<path>`.
    pub endpoint: String,
    /// Method name.
    pub method: String,
    /// JSON params.
    #[arg(long, value_name = "JSON")]
    pub params: Option<String>,
    /// Request id; integers are sent as numbers, anything else as a string.
    #[arg(long, conflicts_with = "notify", default_value = "1")]
    pub id: String,
    /// Send a notification (no id, no reply expected).
    #[arg(long)]
    pub notify: bool,
    /// How long to wait for the reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_endpoint(input: &str) -> CliResult<Endpoint> {
    input
        .parse()
        .map_err(|err| transport_error("invalid endpoint", err))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(number) => (number, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
