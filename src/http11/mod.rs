//! HTTP/1.1 request head parsing for the h2c handshake
//!
//! The first bytes of an h2c connection are either a plain HTTP/1.1
//! request asking to upgrade, or the HTTP/2 connection preface (whose
//! first line parses like a request with method `PRI`). This module
//! reads that request head and converts an upgraded request into the
//! header list for the synthesized stream 1.

use crate::hpack::Header;
use std::collections::HashMap;
use std::io::{BufRead, Read};

/// Response emitted to accept an h2c upgrade, byte for byte.
pub const SWITCHING_PROTOCOLS: &[u8] =
    b"HTTP/1.1 101 Switching Protocols\r\nConnection: Upgrade\r\nUpgrade: h2c\r\n\r\n";

/// Result type for HTTP/1.1 parsing
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP/1.1 parsing errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("connection closed before request was complete")]
    ConnectionClosed,
}

const METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH",
];

/// An HTTP/1.1 request head plus optional body.
///
/// Header names are lowercased; a repeated name keeps the last value.
#[derive(Debug, Default)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub version: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Parse one request from a buffered reader.
    ///
    /// A `PRI` request line is the start of the HTTP/2 preface: the
    /// remaining 8 preface octets are consumed and no headers follow.
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Request> {
        let mut request = Request::default();

        let line = read_line(reader)?;
        let mut parts = line.split_whitespace();
        let (method, target, version) = match (parts.next(), parts.next(), parts.next()) {
            (Some(m), Some(t), Some(v)) => (m, t, v),
            _ => {
                return Err(Error::Parse(format!(
                    "malformed request line: {:?}",
                    line
                )))
            }
        };
        request.method = method.to_string();
        request.target = target.to_string();
        request.version = version.to_string();

        if request.method == "PRI" {
            // "PRI * HTTP/2.0\r\n" is the first line of the 24-octet
            // connection preface; the rest is "\r\nSM\r\n\r\n".
            let mut rest = [0u8; 8];
            reader.read_exact(&mut rest)?;
            return Ok(request);
        }

        if !METHODS.contains(&request.method.as_str()) {
            return Err(Error::Parse(format!(
                "unrecognized method: {:?}",
                request.method
            )));
        }

        loop {
            let line = read_line(reader)?;
            if line.is_empty() {
                break;
            }
            let colon = line
                .find(':')
                .ok_or_else(|| Error::Parse(format!("no colon in header: {}", line)))?;
            let name = line[..colon].trim().to_ascii_lowercase();
            let value = line[colon + 1..].trim().to_string();
            if name.is_empty() {
                return Err(Error::Parse("empty header name".to_string()));
            }
            request.headers.insert(name, value);
        }

        if let Some(cl) = request.headers.get("content-length") {
            let content_length: usize = cl
                .parse()
                .map_err(|_| Error::Parse(format!("invalid content-length: {}", cl)))?;
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body)?;
            request.body = Some(body);
        }

        Ok(request)
    }

    /// Convert the upgraded request into the header list carried by the
    /// synthesized HEADERS frame on stream 1.
    pub fn h2_header_list(&self) -> Vec<Header> {
        let mut headers = vec![
            Header::new(":method", self.method.as_str()),
            Header::new(":path", self.target.as_str()),
            Header::new(
                ":authority",
                self.headers.get("host").map(String::as_str).unwrap_or(""),
            ),
        ];
        for (name, value) in &self.headers {
            headers.push(Header::new(name.as_str(), value.as_str()));
        }
        headers
    }
}

fn read_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut line = String::new();
    let n = reader.read_line(&mut line)?;
    if n == 0 {
        return Err(Error::ConnectionClosed);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}
