//! HTTP/2 connection loop
//!
//! One connection is served by a set of cooperating threads: the reader
//! (this module's loop, owning the socket read side and the HPACK
//! decoder), one writer (sole owner of the socket write side and the
//! HPACK encoder), one task per stream, and one thread per running
//! handler. Streams talk back to the connection through the bounded
//! egress channel rather than holding references to it; a close
//! transition on that channel authorizes the writer to drop the stream
//! from the registry.

use super::codec::FrameCodec;
use super::error::{Error, Result};
use super::frames::{DataFrame, Frame, GoawayFrame, HeadersFrame, PingFrame, SettingsFrame};
use super::request::Handler;
use super::settings::ConnectionSettings;
use super::stream::{Stream, StreamEvent, StreamId, StreamState};
use super::CONNECTION_PREFACE;
use crate::hpack;
use crate::http11;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use bytes::Bytes;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, error, trace, warn};

/// Capacity of the connection's egress queue
const OUTGOING_QUEUE: usize = 64;

/// Events consumed by the connection writer.
#[derive(Debug)]
pub(crate) enum ConnEvent {
    /// Encode and write one frame; HEADERS frames get their block
    /// fragment computed from the header list first.
    Frame(Frame),
    /// A stream changed state; `Closed` removes it from the registry.
    Transition {
        stream_id: StreamId,
        state: StreamState,
    },
    /// Stop the writer and close the socket.
    Shutdown,
}

type StreamMap = Arc<Mutex<HashMap<StreamId, SyncSender<StreamEvent>>>>;

/// One server-side HTTP/2 connection over an established TCP stream.
///
/// ```no_run
/// use h2c::{Connection, Request, ResponseWriter};
/// use std::io::Write;
/// use std::net::TcpListener;
///
/// let listener = TcpListener::bind("127.0.0.1:8080").unwrap();
/// for stream in listener.incoming() {
///     let conn = Connection::new(stream.unwrap(), |req: Request, mut res: ResponseWriter| {
///         res.write_all(format!("Hello, {}", req.path).as_bytes()).unwrap();
///     });
///     std::thread::spawn(move || {
///         if let Err(err) = conn.serve() {
///             eprintln!("connection failed: {}", err);
///         }
///     });
/// }
/// ```
pub struct Connection {
    stream: TcpStream,
    settings: ConnectionSettings,
    handler: Arc<dyn Handler>,
}

impl Connection {
    /// Wrap an established TCP stream with a request handler.
    pub fn new<H: Handler>(stream: TcpStream, handler: H) -> Self {
        Connection {
            stream,
            settings: ConnectionSettings::default(),
            handler: Arc::new(handler),
        }
    }

    /// Replace the initial connection settings.
    pub fn with_settings(mut self, settings: ConnectionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Serve the connection until the peer goes away or a fatal error
    /// ends it. Returns once the socket is closed and the writer has
    /// drained.
    pub fn serve(self) -> Result<()> {
        let peer = self
            .stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        debug!(%peer, "serving h2c connection");

        let mut reader = BufReader::new(self.stream.try_clone()?);
        let mut write_half = self.stream.try_clone()?;
        let mut settings = self.settings;

        let upgrade = match handshake(&mut reader, &mut write_half, &mut settings) {
            Ok(upgrade) => upgrade,
            Err(err) => {
                // Drop the connection with no further response.
                warn!(%peer, error = %err, "handshake failed");
                let _ = self.stream.shutdown(Shutdown::Both);
                return Err(err);
            }
        };

        let registry: StreamMap = Arc::new(Mutex::new(HashMap::new()));
        let (outgoing, egress) = sync_channel(OUTGOING_QUEUE);

        let writer = {
            let registry = registry.clone();
            thread::spawn(move || writer_loop(egress, write_half, registry))
        };

        let mut ingress = Ingress {
            settings,
            decoder: hpack::Decoder::new(),
            registry: registry.clone(),
            outgoing: outgoing.clone(),
            handler: self.handler,
            max_stream_id: 0,
        };

        if let Some(request) = upgrade {
            ingress.dispatch_upgrade_request(request);
        }

        let result = ingress.read_loop(&mut reader);

        // Orderly shutdown: cancel surviving streams so blocked body
        // reads end, let the writer drain whatever is queued (a GOAWAY
        // already ends it), and fail late handler writes.
        let senders: Vec<SyncSender<StreamEvent>> =
            registry.lock().unwrap().drain().map(|(_, tx)| tx).collect();
        for sender in senders {
            let _ = sender.try_send(StreamEvent::Cancel);
        }
        let _ = outgoing.send(ConnEvent::Shutdown);
        drop(outgoing);
        let _ = writer.join();

        debug!(%peer, "connection closed");
        result
    }
}

/// Reader-side connection state: the HPACK decoder, the stream registry,
/// and the highest client stream id seen so far.
struct Ingress {
    settings: ConnectionSettings,
    decoder: hpack::Decoder,
    registry: StreamMap,
    outgoing: SyncSender<ConnEvent>,
    handler: Arc<dyn Handler>,
    max_stream_id: u32,
}

impl Ingress {
    fn read_loop<R: BufRead>(&mut self, reader: &mut R) -> Result<()> {
        loop {
            let frame = match FrameCodec::read_frame(reader, self.settings.max_frame_size) {
                Ok(frame) => frame,
                Err(Error::UnknownFrame(frame_type)) => {
                    trace!(frame_type, "skipping unknown frame");
                    continue;
                }
                Err(Error::Io(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!("peer closed the connection");
                    return Ok(());
                }
                Err(Error::Io(err)) => {
                    error!(error = %err, "transport read failed");
                    return Err(err.into());
                }
                Err(err) => return self.fail(err),
            };

            trace!(frame = %frame.frame_type(), stream_id = frame.stream_id(), "frame received");

            let stream_id = frame.stream_id();
            if stream_id > 0 && stream_id % 2 == 0 {
                return self.fail(Error::Protocol(format!(
                    "client used even stream id {}",
                    stream_id
                )));
            }

            match frame {
                Frame::Headers(mut headers) => {
                    match self.decoder.decode(&headers.block_fragment) {
                        Ok(decoded) => headers.headers = decoded,
                        Err(err) => return self.fail(err.into()),
                    }
                    if !headers.end_headers {
                        if let Err(err) = self.merge_continuations(reader, &mut headers) {
                            return self.fail(err);
                        }
                    }
                    if let Err(err) = self.deliver_headers(headers) {
                        return self.fail(err);
                    }
                }
                Frame::Settings(settings) => {
                    if !settings.ack {
                        debug!(entries = settings.entries.len(), "applying peer settings");
                        self.settings.apply_entries(&settings.entries);
                        self.enqueue(Frame::Settings(SettingsFrame::ack()));
                    }
                }
                Frame::Ping(ping) => {
                    if !ping.ack {
                        self.enqueue(Frame::Ping(PingFrame {
                            ack: true,
                            opaque: ping.opaque,
                        }));
                    }
                }
                Frame::WindowUpdate(_) => {
                    // Tolerated; no flow control in this engine.
                    trace!("ignoring WINDOW_UPDATE");
                }
                Frame::Priority(_) => {
                    // Tolerated; no priority scheduling in this engine.
                    trace!("ignoring PRIORITY");
                }
                Frame::Goaway(goaway) => {
                    debug!(code = %goaway.error_code, last_stream_id = goaway.last_stream_id,
                        "peer sent GOAWAY");
                    return Ok(());
                }
                Frame::Continuation(_) => {
                    return self.fail(Error::Protocol(
                        "CONTINUATION without an open header block".to_string(),
                    ));
                }
                Frame::Data(_) | Frame::RstStream(_) => {
                    if stream_id == 0 {
                        return self.fail(Error::Protocol(format!(
                            "{} frame on stream 0",
                            frame.frame_type()
                        )));
                    }
                    if let Err(err) = self.forward(stream_id, frame) {
                        return self.fail(err);
                    }
                }
            }
        }
    }

    /// Assemble a full header block: every following frame must be a
    /// CONTINUATION on the same stream until END_HEADERS.
    fn merge_continuations<R: BufRead>(
        &mut self,
        reader: &mut R,
        headers: &mut HeadersFrame,
    ) -> Result<()> {
        while !headers.end_headers {
            let frame = FrameCodec::read_frame(reader, self.settings.max_frame_size)?;
            match frame {
                Frame::Continuation(cont) if cont.stream_id == headers.stream_id => {
                    headers
                        .headers
                        .extend(self.decoder.decode(&cont.block_fragment)?);
                    headers.end_headers = cont.end_headers;
                }
                other => {
                    return Err(Error::Protocol(format!(
                        "expected CONTINUATION on stream {}, got {} on stream {}",
                        headers.stream_id,
                        other.frame_type(),
                        other.stream_id()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Hand a merged HEADERS frame to its stream, allocating the stream
    /// first when the id is new. New ids must be strictly greater than
    /// every client id seen before.
    fn deliver_headers(&mut self, headers: HeadersFrame) -> Result<()> {
        let stream_id = headers.stream_id;
        let sender = self.registry.lock().unwrap().get(&stream_id).cloned();
        let sender = match sender {
            Some(sender) => sender,
            None => {
                if stream_id <= self.max_stream_id {
                    return Err(Error::Protocol(format!(
                        "stream id {} not above highest seen {}",
                        stream_id, self.max_stream_id
                    )));
                }
                debug!(stream_id, "creating stream");
                self.max_stream_id = stream_id;
                let sender =
                    Stream::spawn(stream_id, self.outgoing.clone(), self.handler.clone());
                self.registry
                    .lock()
                    .unwrap()
                    .insert(stream_id, sender.clone());
                sender
            }
        };
        // A send failure means the stream task is already gone; it was
        // reset concurrently and the frame is moot.
        let _ = sender.send(StreamEvent::Frame(Frame::Headers(headers)));
        Ok(())
    }

    /// Forward a stream-addressed frame to its stream task.
    fn forward(&mut self, stream_id: StreamId, frame: Frame) -> Result<()> {
        let sender = self.registry.lock().unwrap().get(&stream_id).cloned();
        match sender {
            Some(sender) => {
                let _ = sender.send(StreamEvent::Frame(frame));
                Ok(())
            }
            None if stream_id <= self.max_stream_id => Err(Error::StreamClosed(stream_id)),
            None => Err(Error::Protocol(format!(
                "frame for unopened stream {}",
                stream_id
            ))),
        }
    }

    fn enqueue(&self, frame: Frame) {
        let _ = self.outgoing.send(ConnEvent::Frame(frame));
    }

    /// Report a connection fault to the peer and end the read loop: a
    /// GOAWAY carrying the highest stream id and the fault's error code.
    fn fail(&self, err: Error) -> Result<()> {
        warn!(error = %err, code = %err.error_code(), "connection fault");
        let goaway = GoawayFrame::new(self.max_stream_id, err.error_code());
        self.enqueue(Frame::Goaway(goaway));
        Err(err)
    }

    /// Feed the upgraded HTTP/1.1 request into stream 1: one HEADERS
    /// frame, then the body fragmented at MAX_FRAME_SIZE.
    fn dispatch_upgrade_request(&mut self, request: http11::Request) {
        self.max_stream_id = 1;
        let sender = Stream::spawn(1, self.outgoing.clone(), self.handler.clone());
        self.registry.lock().unwrap().insert(1, sender.clone());

        let body = request.body.as_deref().unwrap_or_default();
        let headers = HeadersFrame::from_headers(1, request.h2_header_list(), body.is_empty());
        debug!(method = %request.method, target = %request.target,
            "dispatching upgraded request on stream 1");
        let _ = sender.send(StreamEvent::Frame(Frame::Headers(headers)));

        let max = self.settings.max_frame_size as usize;
        let mut offset = 0;
        while offset < body.len() {
            let end = (offset + max).min(body.len());
            let data = DataFrame::new(1, Bytes::copy_from_slice(&body[offset..end]), end == body.len());
            let _ = sender.send(StreamEvent::Frame(Frame::Data(data)));
            offset = end;
        }
    }
}

/// The h2c handshake: either the connection preface (prior knowledge) or
/// an HTTP/1.1 upgrade request whose settings and body carry over into
/// the HTTP/2 session.
fn handshake<R: BufRead, W: Write>(
    reader: &mut R,
    out: &mut W,
    settings: &mut ConnectionSettings,
) -> Result<Option<http11::Request>> {
    let request = http11::Request::read_from(reader)?;

    if request.method == "PRI" {
        debug!("connection opened with prior knowledge preface");
        out.write_all(&FrameCodec::encode_frame(&Frame::Settings(
            SettingsFrame::empty(),
        )))?;
        return Ok(None);
    }

    match request.headers.get("upgrade").map(String::as_str) {
        Some("h2c") => {}
        other => {
            return Err(Error::Protocol(format!(
                "expected 'h2c' in upgrade, got {:?}",
                other
            )))
        }
    }
    let encoded = request
        .headers
        .get("http2-settings")
        .ok_or_else(|| Error::Protocol("missing http2-settings header".to_string()))?;
    let payload = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|err| Error::Protocol(format!("invalid http2-settings value: {}", err)))?;
    settings.decode_payload(&payload)?;

    out.write_all(http11::SWITCHING_PROTOCOLS)?;
    out.write_all(&FrameCodec::encode_frame(&Frame::Settings(
        SettingsFrame::empty(),
    )))?;

    // The client repeats the full preface after the 101.
    let mut preface = [0u8; 24];
    reader.read_exact(&mut preface)?;
    if &preface[..] != CONNECTION_PREFACE {
        warn!("client preface did not match the connection magic");
    }

    debug!(method = %request.method, target = %request.target, "upgraded to h2c");
    Ok(Some(request))
}

/// The single writer: every byte the peer sees is encoded and written
/// here, in the order events were enqueued. Writing a GOAWAY (ours or a
/// drained fault) ends the connection.
fn writer_loop(egress: Receiver<ConnEvent>, mut out: TcpStream, registry: StreamMap) {
    let mut encoder = hpack::Encoder::new();

    while let Ok(event) = egress.recv() {
        match event {
            ConnEvent::Frame(mut frame) => {
                if let Frame::Headers(headers) = &mut frame {
                    headers.block_fragment = encoder.encode(&headers.headers);
                }
                trace!(frame = %frame.frame_type(), stream_id = frame.stream_id(),
                    "writing frame");
                let wire = FrameCodec::encode_frame(&frame);
                if let Err(err) = out.write_all(&wire) {
                    error!(error = %err, "transport write failed");
                    break;
                }
                if matches!(frame, Frame::Goaway(_)) {
                    debug!("GOAWAY written, closing connection");
                    break;
                }
            }
            ConnEvent::Transition { stream_id, state } => {
                trace!(stream_id, ?state, "stream transition");
                if state == StreamState::Closed {
                    registry.lock().unwrap().remove(&stream_id);
                }
            }
            ConnEvent::Shutdown => break,
        }
    }

    let _ = out.shutdown(Shutdown::Both);
}
