use std::collections::HashMap;
use std::io::{BufRead, Read};

use crate::error::{FrameError, Result};

/// The only mandatory header, in its normalized (lowercase) form.
pub const CONTENT_LENGTH: &str = "content-length";

/// Separator between a header name and its value.
pub const HEADER_SEPARATOR: &str = ": ";

/// Upper bound on the size of a header block.
pub const MAX_HEADER_BLOCK: usize = 8 * 1024;

/// Header names mapped to values, names lowercased on insert.
///
/// `Content-Length` is the only header with defined meaning. Anything else
/// (e.g. `Content-Type`) is kept but otherwise ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: HashMap<String, String>,
}

impl Headers {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any previous value for the same name.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.entries.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Look up a header by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The declared body length.
    pub fn content_length(&self) -> Result<usize> {
        let value = self
            .entries
            .get(CONTENT_LENGTH)
            .ok_or(FrameError::MissingContentLength)?;
        value
            .parse::<usize>()
            .map_err(|_| FrameError::InvalidContentLength {
                value: value.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn require_content_length(self) -> Result<Self> {
        if self.entries.contains_key(CONTENT_LENGTH) {
            Ok(self)
        } else {
            Err(FrameError::MissingContentLength)
        }
    }
}

/// Parse one header line (terminator already removed).
pub fn parse_header_line(line: &[u8]) -> Result<(String, String)> {
    let text = std::str::from_utf8(line).map_err(|_| FrameError::MalformedHeader)?;
    let mut parts = text.split(HEADER_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(value), None) => Ok((name.to_ascii_lowercase(), value.to_string())),
        _ => Err(FrameError::MalformedHeader),
    }
}

/// Strip the line terminator: `\n` plus at most one preceding `\r`.
pub(crate) fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Read a header block from `reader`, stopping after the empty line.
///
/// Nothing past the terminating empty line is consumed, so the body is still
/// available to the caller even when this fails on a missing
/// `Content-Length`.
pub fn parse_headers<R: BufRead>(reader: &mut R) -> Result<Headers> {
    let mut headers = Headers::new();
    let mut consumed = 0usize;
    let mut line = Vec::with_capacity(64);

    loop {
        line.clear();
        // One byte past the cap is enough to tell an oversized block apart.
        let budget = (MAX_HEADER_BLOCK - consumed + 1) as u64;
        let read = reader.by_ref().take(budget).read_until(b'\n', &mut line)?;

        consumed += read;
        if consumed > MAX_HEADER_BLOCK {
            return Err(FrameError::HeaderTooLarge {
                max: MAX_HEADER_BLOCK,
            });
        }
        if read == 0 || !line.ends_with(b"\n") {
            return Err(FrameError::headers_eof());
        }

        let trimmed = trim_line_end(&line);
        if trimmed.is_empty() {
            break;
        }

        let (name, value) = parse_header_line(trimmed)?;
        headers.entries.insert(name, value);
    }

    headers.require_content_length()
}
