//! Per-stream state machine (RFC 7540 Section 5.1)
//!
//! Each stream runs on its own task, consuming a bounded event channel
//! fed by the connection reader (frames) and by the handler thread (a
//! completion signal). The stream never touches the socket: everything
//! it emits goes through the connection's egress queue, and every state
//! change is reported there so the connection can reap closed streams.
//!
//! ```text
//!            idle ──HEADERS──▶ open ──DATA(ES)/HEADERS(ES)──▶ half-closed(remote)
//!              │                │ RST_STREAM                      │ RST_STREAM /
//!              │                ▼                                 │ other frame (RST sent)
//!              └──────────▶  closed ◀──────────────────────────────┘
//!                              ▲
//!                              └── handler completion (final flush)
//! ```

use super::connection::ConnEvent;
use super::error::ErrorCode;
use super::frames::{Frame, RstStreamFrame};
use super::request::{BodyReader, Handler, Request, ResponseWriter};
use crate::hpack::Header;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace, warn};

/// Stream ID type
pub type StreamId = u32;

/// Events a stream task consumes
#[derive(Debug)]
pub enum StreamEvent {
    /// A frame from the connection reader
    Frame(Frame),
    /// The application handler returned
    HandlerDone,
    /// The connection is shutting down; release the body reader and
    /// fail pending handler writes
    Cancel,
}

/// Stream state as defined in RFC 7540 Section 5.1.
///
/// The reserved states belong to server push, which this engine never
/// initiates or accepts; they are representable but never entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No frames exchanged yet
    Idle,
    /// PUSH_PROMISE sent (unused)
    ReservedLocal,
    /// PUSH_PROMISE received (unused)
    ReservedRemote,
    /// Both sides may send
    Open,
    /// We finished sending, the peer may still send
    HalfClosedLocal,
    /// The peer finished sending, we may still send
    HalfClosedRemote,
    /// Stream is done; the id is never reused
    Closed,
}

/// Capacity of a stream's incoming event queue
const STREAM_QUEUE: usize = 16;

pub(crate) struct Stream {
    id: StreamId,
    state: StreamState,
    req_headers: Vec<Header>,
    body: BodyReader,
    response: ResponseWriter,
    outgoing: SyncSender<ConnEvent>,
    events: SyncSender<StreamEvent>,
    handler: Arc<dyn Handler>,
    handler_started: bool,
}

impl Stream {
    /// Start a stream task; the returned sender is the reader's delivery
    /// channel for this stream id.
    pub(crate) fn spawn(
        id: StreamId,
        outgoing: SyncSender<ConnEvent>,
        handler: Arc<dyn Handler>,
    ) -> SyncSender<StreamEvent> {
        let (tx, rx) = sync_channel(STREAM_QUEUE);
        let stream = Stream {
            id,
            state: StreamState::Idle,
            req_headers: Vec::new(),
            body: BodyReader::new(),
            response: ResponseWriter::new(id, outgoing.clone()),
            outgoing,
            events: tx.clone(),
            handler,
            handler_started: false,
        };
        thread::spawn(move || stream.run(rx));
        tx
    }

    fn run(mut self, rx: Receiver<StreamEvent>) {
        trace!(stream_id = self.id, "stream task starting");
        while self.state != StreamState::Closed {
            let event = match rx.recv() {
                Ok(event) => event,
                Err(_) => break,
            };
            match event {
                StreamEvent::Frame(frame) => self.handle_frame(frame),
                StreamEvent::HandlerDone => {
                    self.response.finish();
                    self.set_state(StreamState::Closed);
                }
                StreamEvent::Cancel => {
                    self.body.finish();
                    self.set_state(StreamState::Closed);
                }
            }
        }
        // Anything the handler writes from here on fails with a broken
        // pipe instead of reaching a dead stream.
        self.response.mark_closed();
        trace!(stream_id = self.id, "stream task done");
    }

    fn set_state(&mut self, state: StreamState) {
        trace!(stream_id = self.id, from = ?self.state, to = ?state, "stream transition");
        self.state = state;
        let _ = self.outgoing.send(ConnEvent::Transition {
            stream_id: self.id,
            state,
        });
    }

    fn handle_frame(&mut self, frame: Frame) {
        match self.state {
            StreamState::Idle => self.handle_idle(frame),
            StreamState::Open => self.handle_open(frame),
            StreamState::HalfClosedRemote => self.handle_half_closed_remote(frame),
            state => {
                warn!(stream_id = self.id, ?state, frame = %frame.frame_type(),
                    "frame in unhandled state");
            }
        }
    }

    fn handle_idle(&mut self, frame: Frame) {
        match frame {
            Frame::Headers(headers) => {
                self.req_headers.extend(headers.headers);
                self.set_state(StreamState::Open);
                if headers.end_stream {
                    self.body.finish();
                    self.set_state(StreamState::HalfClosedRemote);
                }
                self.start_handler();
            }
            Frame::WindowUpdate(_) | Frame::Priority(_) => {}
            other => {
                warn!(stream_id = self.id, frame = %other.frame_type(),
                    "unhandled frame in idle state");
            }
        }
    }

    fn handle_open(&mut self, frame: Frame) {
        match frame {
            Frame::Data(data) => {
                self.body.push(&data.data);
                if data.end_stream {
                    self.body.finish();
                    self.set_state(StreamState::HalfClosedRemote);
                }
            }
            Frame::RstStream(rst) => {
                debug!(stream_id = self.id, code = %rst.error_code, "stream reset by peer");
                self.set_state(StreamState::Closed);
            }
            Frame::WindowUpdate(_) | Frame::Priority(_) => {}
            other => {
                warn!(stream_id = self.id, frame = %other.frame_type(),
                    "unhandled frame in open state");
            }
        }
    }

    fn handle_half_closed_remote(&mut self, frame: Frame) {
        match frame {
            Frame::WindowUpdate(_) | Frame::Priority(_) => {}
            Frame::RstStream(rst) => {
                debug!(stream_id = self.id, code = %rst.error_code, "stream reset by peer");
                self.set_state(StreamState::Closed);
            }
            other => {
                // The peer already half closed; anything else on this
                // stream is answered with STREAM_CLOSED.
                debug!(stream_id = self.id, frame = %other.frame_type(),
                    "frame after half close, resetting stream");
                let rst = RstStreamFrame {
                    stream_id: self.id,
                    error_code: ErrorCode::StreamClosed,
                };
                let _ = self.outgoing.send(ConnEvent::Frame(Frame::RstStream(rst)));
                self.set_state(StreamState::Closed);
            }
        }
    }

    /// Launch the application handler on its own thread, exactly once.
    fn start_handler(&mut self) {
        if self.handler_started {
            return;
        }
        self.handler_started = true;

        let request = Request::from_header_list(&self.req_headers, self.body.clone());
        let response = self.response.clone();
        let handler = self.handler.clone();
        let done = self.events.clone();
        let stream_id = self.id;
        thread::spawn(move || {
            trace!(stream_id, "handler starting");
            handler.handle(request, response);
            // The stream may already be gone; nothing to flush then.
            let _ = done.send(StreamEvent::HandlerDone);
        });
    }
}
