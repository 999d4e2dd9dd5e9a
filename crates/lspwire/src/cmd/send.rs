use lspwire_frame::FrameConfig;
use lspwire_jsonrpc::{Id, RequestMessage};
use lspwire_server::{Client, Reply};
use serde_json::value::RawValue;

use crate::cmd::{parse_duration, parse_endpoint, SendArgs};
use crate::exit::{server_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let endpoint = parse_endpoint(&args.endpoint)?;
    let timeout = parse_duration(&args.timeout)?;
    let message = build_message(&args)?;

    let client = Client::new(endpoint).with_config(FrameConfig {
        read_timeout: Some(timeout),
        write_timeout: Some(timeout),
        ..FrameConfig::default()
    });
    let reply = client
        .send(&message)
        .map_err(|err| server_error("request failed", err))?;

    print_reply(&reply, format);
    Ok(exit_code(&reply, message.is_notification()))
}

fn build_message(args: &SendArgs) -> CliResult<RequestMessage> {
    let params = args.params.as_deref().map(parse_params).transpose()?;
    if args.notify {
        return Ok(RequestMessage::notification(&args.method, params));
    }
    Ok(RequestMessage::request(
        parse_id(&args.id)?,
        &args.method,
        params,
    ))
}

fn parse_params(json: &str) -> CliResult<Box<RawValue>> {
    RawValue::from_string(json.to_string())
        .map_err(|err| CliError::usage(format!("--params is not valid JSON: {err}")))
}

fn parse_id(input: &str) -> CliResult<Id> {
    if input.is_empty() {
        return Err(CliError::usage("--id must not be empty"));
    }
    Ok(match input.parse::<i64>() {
        Ok(number) => Id::Number(number),
        Err(_) => Id::Text(input.to_string()),
    })
}

/// Success only for a result, or for silence after a notification.
fn exit_code(reply: &Reply, notification: bool) -> i32 {
    match reply {
        Reply::Response(response) if !response.is_error() => SUCCESS,
        Reply::Empty if notification => SUCCESS,
        _ => FAILURE,
    }
}
