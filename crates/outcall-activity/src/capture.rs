//! Wire-level text capture of requests and responses.
//!
//! The rendering follows HTTP/1.1 framing so a stored capture can be read
//! back or replayed by hand: request/status line, one `Name: value` line per
//! header sorted by name, an empty line, then the body. Bodies that are not
//! UTF-8 are rendered lossily.

use reqwest::header::{CONTENT_LENGTH, HOST, HeaderMap};

use crate::error::CaptureError;
use crate::transport::{OutboundRequest, TransportResponse};

const CRLF: &str = "\r\n";

/// Render a request as it would appear on the wire.
pub fn dump_request(request: &OutboundRequest) -> Result<String, CaptureError> {
    let url = &request.url;
    let host = url
        .host_str()
        .ok_or_else(|| CaptureError::MissingHost(url.to_string()))?;
    let host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut out = format!("{} {} HTTP/1.1{CRLF}", request.method, target);
    if !request.headers.contains_key(HOST) {
        out.push_str(&format!("Host: {host}{CRLF}"));
    }

    let mut extra = Vec::new();
    if let Some(body) = &request.body {
        if !request.headers.contains_key(CONTENT_LENGTH) {
            extra.push(("content-length".to_string(), body.len().to_string()));
        }
    }
    write_headers(&mut out, &request.headers, extra);
    out.push_str(CRLF);

    if let Some(body) = &request.body {
        out.push_str(&String::from_utf8_lossy(body));
    }
    Ok(out)
}

/// Render a buffered response as it would appear on the wire.
pub fn dump_response(response: &TransportResponse) -> String {
    let mut out = format!("{:?} {}", response.version, response.status.as_u16());
    if let Some(reason) = response.status.canonical_reason() {
        out.push(' ');
        out.push_str(reason);
    }
    out.push_str(CRLF);

    let mut extra = Vec::new();
    if !response.headers.contains_key(CONTENT_LENGTH) {
        extra.push(("content-length".to_string(), response.body.len().to_string()));
    }
    write_headers(&mut out, &response.headers, extra);
    out.push_str(CRLF);
    out.push_str(&String::from_utf8_lossy(&response.body));
    out
}

fn write_headers(out: &mut String, headers: &HeaderMap, extra: Vec<(String, String)>) {
    let mut lines: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .chain(extra)
        .collect();
    // Stable order keeps captures of identical calls byte-identical.
    lines.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, value) in lines {
        out.push_str(&canonical_name(&name));
        out.push_str(": ");
        out.push_str(&value);
        out.push_str(CRLF);
    }
}

/// `content-type` -> `Content-Type`.
fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
