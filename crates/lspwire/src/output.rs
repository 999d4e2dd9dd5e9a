use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use lspwire_jsonrpc::{Id, ResponseError};
use lspwire_server::Reply;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReplyOutput<'a> {
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a ResponseError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

impl<'a> ReplyOutput<'a> {
    fn from_reply(reply: &'a Reply) -> Self {
        let empty = Self {
            kind: "empty",
            id: None,
            result: None,
            error: None,
            message: None,
        };
        match reply {
            Reply::Response(response) => Self {
                kind: if response.is_error() { "error" } else { "response" },
                id: Some(response.id()),
                result: response.result(),
                error: response.error(),
                ..empty
            },
            Reply::Diagnostic(text) => Self {
                kind: "diagnostic",
                message: Some(text),
                ..empty
            },
            Reply::Empty => empty,
        }
    }
}

pub fn render_reply(reply: &Reply, format: OutputFormat) -> Vec<u8> {
    let out = ReplyOutput::from_reply(reply);
    match format {
        OutputFormat::Json => serde_json::to_vec(&out).unwrap_or_else(|_| b"{}".to_vec()),
        OutputFormat::Pretty => {
            serde_json::to_vec_pretty(&out).unwrap_or_else(|_| b"{}".to_vec())
        }
        OutputFormat::Table => {
            let detail = match (out.result, out.error, out.message) {
                (Some(result), _, _) => result.to_string(),
                (_, Some(error), _) => error.to_string(),
                (_, _, Some(message)) => message.to_string(),
                _ => String::new(),
            };
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "ID", "DETAIL"])
                .add_row(vec![
                    out.kind.to_string(),
                    out.id.map(ToString::to_string).unwrap_or_default(),
                    detail,
                ]);
            table.to_string().into_bytes()
        }
        OutputFormat::Raw => match reply {
            Reply::Response(response) => response.encode().unwrap_or_default(),
            Reply::Diagnostic(text) => text.as_bytes().to_vec(),
            Reply::Empty => Vec::new(),
        },
    }
}

pub fn print_reply(reply: &Reply, format: OutputFormat) {
    let mut rendered = render_reply(reply, format);
    if !matches!(format, OutputFormat::Raw) {
        rendered.push(b'\n');
    }
    print_raw(&rendered);
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
