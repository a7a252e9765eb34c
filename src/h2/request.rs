//! Application-facing request and response values
//!
//! The engine hands each stream's handler a [`Request`] (pseudo-header
//! fields broken out, remaining headers lowercased, plus a blocking body
//! reader) and a [`ResponseWriter`] that buffers output and fragments it
//! into DATA frames on the connection's egress queue.

use super::connection::ConnEvent;
use super::frames::{DataFrame, Frame, HeadersFrame};
use crate::hpack::Header;
use bytes::BytesMut;
use std::io::{self, Read, Write};
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Condvar, Mutex};

/// Flush threshold for buffered response bytes.
const FLUSH_CHUNK: usize = 4096;

/// An application request handler.
///
/// One handler invocation runs per stream, each on its own thread. The
/// engine does not interpret the request path.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: Request, response: ResponseWriter);
}

impl<F> Handler for F
where
    F: Fn(Request, ResponseWriter) + Send + Sync + 'static,
{
    fn handle(&self, request: Request, response: ResponseWriter) {
        self(request, response)
    }
}

/// Ordered header collection with case-insensitive lookup.
///
/// Insertion order is preserved and a name may appear more than once.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    headers: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty collection
    pub fn new() -> Self {
        Headers {
            headers: Vec::new(),
        }
    }

    /// Append a header; an existing name gains another value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// First value for a name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for a name (case-insensitive)
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Whether a name is present (case-insensitive)
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of headers
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// A request delivered to a handler.
#[derive(Debug)]
pub struct Request {
    /// `:method` pseudo-header
    pub method: String,
    /// `:path` pseudo-header
    pub path: String,
    /// `:authority` pseudo-header
    pub authority: String,
    /// Remaining headers, names lowercased
    pub headers: Headers,
    /// Request body; reads block until DATA arrives or the stream half
    /// closes
    pub body: BodyReader,
}

impl Request {
    /// Build a request from a merged header list, splitting out the
    /// pseudo-header fields.
    pub(crate) fn from_header_list(list: &[Header], body: BodyReader) -> Request {
        let mut request = Request {
            method: String::new(),
            path: String::new(),
            authority: String::new(),
            headers: Headers::new(),
            body,
        };
        for header in list {
            match header.name.as_str() {
                ":method" => request.method = header.value.clone(),
                ":path" => request.path = header.value.clone(),
                ":authority" => request.authority = header.value.clone(),
                name if name.starts_with(':') => {}
                name => request.headers.insert(name, header.value.as_str()),
            }
        }
        request
    }
}

#[derive(Default)]
struct BodyState {
    buf: BytesMut,
    eof: bool,
}

struct BodyShared {
    state: Mutex<BodyState>,
    available: Condvar,
}

/// Readable request body fed by DATA frames.
///
/// Reads return queued octets, blocking while the buffer is empty and the
/// stream is still open; once end-of-stream is marked and the buffer
/// drained, reads return 0.
#[derive(Clone)]
pub struct BodyReader {
    shared: Arc<BodyShared>,
}

impl std::fmt::Debug for BodyReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyReader").finish()
    }
}

impl BodyReader {
    pub(crate) fn new() -> Self {
        BodyReader {
            shared: Arc::new(BodyShared {
                state: Mutex::new(BodyState::default()),
                available: Condvar::new(),
            }),
        }
    }

    /// Queue octets from a DATA frame.
    pub(crate) fn push(&self, data: &[u8]) {
        let mut state = self.shared.state.lock().unwrap();
        state.buf.extend_from_slice(data);
        self.shared.available.notify_all();
    }

    /// Mark end-of-stream.
    pub(crate) fn finish(&self) {
        let mut state = self.shared.state.lock().unwrap();
        state.eof = true;
        self.shared.available.notify_all();
    }
}

impl Read for BodyReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let mut state = self.shared.state.lock().unwrap();
        loop {
            if !state.buf.is_empty() {
                let n = out.len().min(state.buf.len());
                out[..n].copy_from_slice(&state.buf.split_to(n));
                return Ok(n);
            }
            if state.eof {
                return Ok(0);
            }
            state = self.shared.available.wait(state).unwrap();
        }
    }
}

struct ResponseState {
    stream_id: u32,
    status: u16,
    headers: Headers,
    buf: BytesMut,
    sent_headers: bool,
    closed: bool,
    outgoing: SyncSender<ConnEvent>,
}

impl ResponseState {
    /// Emit the HEADERS frame once, applying default headers.
    fn send_headers(&mut self) -> io::Result<()> {
        if self.sent_headers {
            return Ok(());
        }
        if !self.headers.contains("content-type") {
            self.headers
                .insert("content-type", "text/plain; charset=utf-8");
        }
        if !self.headers.contains("date") {
            let now = chrono::Local::now();
            self.headers
                .insert("date", now.to_rfc3339_opts(chrono::SecondsFormat::Secs, false));
        }

        let mut list = vec![Header::new(":status", self.status.to_string())];
        for (name, value) in self.headers.iter() {
            list.push(Header::new(name, value));
        }

        let frame = HeadersFrame::from_headers(self.stream_id, list, false);
        self.send(Frame::Headers(frame))?;
        self.sent_headers = true;
        Ok(())
    }

    /// Emit one DATA frame of at most `FLUSH_CHUNK` octets.
    fn send_chunk(&mut self, end_stream: bool) -> io::Result<()> {
        self.send_headers()?;
        let n = self.buf.len().min(FLUSH_CHUNK);
        let data = self.buf.split_to(n).freeze();
        let frame = DataFrame::new(self.stream_id, data, end_stream);
        self.send(Frame::Data(frame))
    }

    fn send(&mut self, frame: Frame) -> io::Result<()> {
        self.outgoing
            .send(ConnEvent::Frame(frame))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "connection writer gone"))
    }
}

/// Buffered response writer handed to the handler.
///
/// Cloneable handle: the stream machine keeps one to perform the final
/// flush when the handler returns, the handler owns another.
#[derive(Clone)]
pub struct ResponseWriter {
    inner: Arc<Mutex<ResponseState>>,
}

impl ResponseWriter {
    pub(crate) fn new(stream_id: u32, outgoing: SyncSender<ConnEvent>) -> Self {
        ResponseWriter {
            inner: Arc::new(Mutex::new(ResponseState {
                stream_id,
                status: 200,
                headers: Headers::new(),
                buf: BytesMut::new(),
                sent_headers: false,
                closed: false,
                outgoing,
            })),
        }
    }

    /// Add a response header. Names are sent lowercased; headers set
    /// after the first flush are not transmitted.
    pub fn set_header(&self, name: impl Into<String>, value: impl Into<String>) {
        let name: String = name.into();
        let mut state = self.inner.lock().unwrap();
        state.headers.insert(name.to_ascii_lowercase(), value);
    }

    /// Set the response status code (default 200). Takes effect until
    /// the headers are flushed with the first DATA frame.
    pub fn write_header(&self, status: u16) {
        let mut state = self.inner.lock().unwrap();
        state.status = status;
    }

    /// Final flush on handler completion: headers if not yet sent, any
    /// buffered data, and a terminating DATA frame with END_STREAM set
    /// even when empty.
    pub(crate) fn finish(&self) {
        let mut state = self.inner.lock().unwrap();
        if state.closed {
            return;
        }
        while state.buf.len() > FLUSH_CHUNK {
            if state.send_chunk(false).is_err() {
                state.closed = true;
                return;
            }
        }
        if state.send_chunk(true).is_err() {
            state.closed = true;
        }
    }

    /// Fail any further writes; used when the stream closes under the
    /// handler.
    pub(crate) fn mark_closed(&self) {
        let mut state = self.inner.lock().unwrap();
        state.closed = true;
    }
}

impl Write for ResponseWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut state = self.inner.lock().unwrap();
        if state.closed {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "stream is closed",
            ));
        }
        state.buf.extend_from_slice(data);
        while state.buf.len() > FLUSH_CHUNK {
            state.send_chunk(false)?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Output is buffered until the threshold or the final flush;
        // matching the DATA fragmentation contract.
        Ok(())
    }
}
