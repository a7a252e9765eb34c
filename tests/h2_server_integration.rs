//! End-to-end connection tests
//!
//! Each test binds a listener on a loopback port, serves connections
//! with a small echo-style handler, and drives the wire protocol from
//! the client side of a real TCP socket: the h2c upgrade dance, the
//! prior-knowledge preface, request bodies, and the GOAWAY/RST_STREAM
//! fault paths.

use bytes::Bytes;
use h2c::h2::codec::FrameCodec;
use h2c::h2::error::ErrorCode;
use h2c::h2::frames::*;
use h2c::h2::CONNECTION_PREFACE;
use h2c::hpack::{Decoder, Encoder, Header};
use h2c::http11::SWITCHING_PROTOCOLS;
use h2c::{Connection, Request, ResponseWriter};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

/// Serve connections with the shared test handler; returns the address.
fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let conn = Connection::new(stream, handler);
            thread::spawn(move || {
                let _ = conn.serve();
            });
        }
    });

    addr
}

/// GET answers "Hello"; POST echoes the body length; /slow stalls long
/// enough for a frame to race the handler.
fn handler(mut req: Request, mut res: ResponseWriter) {
    if req.path == "/slow" {
        thread::sleep(Duration::from_millis(300));
    }
    if req.method == "POST" {
        let mut body = Vec::new();
        let _ = req.body.read_to_end(&mut body);
        let _ = res.write_all(format!("received {} bytes", body.len()).as_bytes());
    } else {
        let _ = res.write_all(b"Hello");
    }
}

fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream
}

fn read_frame(stream: &mut TcpStream) -> Frame {
    FrameCodec::read_frame(stream, 0x00FF_FFFF).expect("frame from server")
}

/// Open a prior-knowledge connection: preface plus an empty SETTINGS
/// frame, consuming the server's SETTINGS and its ACK of ours.
fn open_prior_knowledge(addr: SocketAddr) -> TcpStream {
    let mut stream = connect(addr);
    stream.write_all(CONNECTION_PREFACE).unwrap();
    stream
        .write_all(&FrameCodec::encode_frame(&Frame::Settings(
            SettingsFrame::empty(),
        )))
        .unwrap();

    match read_frame(&mut stream) {
        Frame::Settings(s) => assert!(!s.ack, "first server frame is its SETTINGS"),
        other => panic!("expected SETTINGS, got {:?}", other),
    }
    match read_frame(&mut stream) {
        Frame::Settings(s) => assert!(s.ack, "second server frame acks ours"),
        other => panic!("expected SETTINGS ACK, got {:?}", other),
    }
    stream
}

fn request_headers(stream_id: u32, method: &str, path: &str, end_stream: bool) -> Bytes {
    let block = Encoder::new().encode(&[
        Header::new(":method", method),
        Header::new(":path", path),
        Header::new(":scheme", "http"),
        Header::new(":authority", "localhost:8080"),
    ]);
    FrameCodec::encode_frame(&Frame::Headers(HeadersFrame::new(
        stream_id, block, end_stream, true,
    )))
}

/// Read frames until this stream's HEADERS plus final DATA arrive;
/// returns (status, body).
fn read_response(stream: &mut TcpStream, stream_id: u32) -> (String, Vec<u8>) {
    let mut decoder = Decoder::new();
    let mut status = String::new();
    let mut body = Vec::new();
    loop {
        match read_frame(stream) {
            Frame::Headers(h) if h.stream_id == stream_id => {
                assert!(h.end_headers);
                let headers = decoder.decode(&h.block_fragment).unwrap();
                assert_eq!(headers[0].name, ":status");
                status = headers[0].value.clone();
                let names: Vec<_> = headers.iter().map(|h| h.name.clone()).collect();
                assert!(names.contains(&"content-type".to_string()));
                assert!(names.contains(&"date".to_string()));
            }
            Frame::Data(d) if d.stream_id == stream_id => {
                body.extend_from_slice(&d.data);
                if d.end_stream {
                    return (status, body);
                }
            }
            Frame::Settings(_) | Frame::Ping(_) => {}
            other => panic!("unexpected frame {:?}", other),
        }
    }
}

fn expect_goaway(stream: &mut TcpStream, code: ErrorCode) {
    loop {
        // Frames for already-answered streams may precede the GOAWAY.
        if let Frame::Goaway(goaway) = read_frame(stream) {
            assert_eq!(goaway.error_code, code);
            return;
        }
    }
}

#[test]
fn test_h2c_upgrade_get() {
    let addr = start_server();
    let mut stream = connect(addr);

    stream
        .write_all(
            b"GET / HTTP/1.1\r\nHost: localhost:8080\r\nUpgrade: h2c\r\nHTTP2-Settings: AAMAAABkAAQAoAAAAAIAAAAA\r\n\r\n",
        )
        .unwrap();
    stream.write_all(CONNECTION_PREFACE).unwrap();

    // The 101 comes back literally.
    let mut switch = vec![0u8; SWITCHING_PROTOCOLS.len()];
    stream.read_exact(&mut switch).unwrap();
    assert_eq!(switch, SWITCHING_PROTOCOLS);

    // Then an empty SETTINGS frame.
    match read_frame(&mut stream) {
        Frame::Settings(s) => {
            assert!(!s.ack);
            assert!(s.entries.is_empty());
        }
        other => panic!("expected SETTINGS, got {:?}", other),
    }

    // The upgraded request is answered on stream 1.
    let (status, body) = read_response(&mut stream, 1);
    assert_eq!(status, "200");
    assert_eq!(body, b"Hello");
}

#[test]
fn test_prior_knowledge_get() {
    let addr = start_server();
    let mut stream = open_prior_knowledge(addr);

    stream
        .write_all(&request_headers(1, "GET", "/", true))
        .unwrap();

    let (status, body) = read_response(&mut stream, 1);
    assert_eq!(status, "200");
    assert_eq!(body, b"Hello");
}

#[test]
fn test_post_with_data_frames() {
    let addr = start_server();
    let mut stream = open_prior_knowledge(addr);

    stream
        .write_all(&request_headers(3, "POST", "/", false))
        .unwrap();
    stream
        .write_all(&FrameCodec::encode_frame(&Frame::Data(DataFrame::new(
            3,
            Bytes::from_static(b"hello"),
            true,
        ))))
        .unwrap();

    let (status, body) = read_response(&mut stream, 3);
    assert_eq!(status, "200");
    assert_eq!(body, b"received 5 bytes");
}

#[test]
fn test_sequential_streams_on_one_connection() {
    let addr = start_server();
    let mut stream = open_prior_knowledge(addr);

    for stream_id in [1u32, 3, 5] {
        stream
            .write_all(&request_headers(stream_id, "GET", "/", true))
            .unwrap();
        let (status, body) = read_response(&mut stream, stream_id);
        assert_eq!(status, "200");
        assert_eq!(body, b"Hello");
    }
}

#[test]
fn test_continuation_interleave_is_protocol_error() {
    let addr = start_server();
    let mut stream = open_prior_knowledge(addr);

    // HEADERS without END_HEADERS, then another stream's HEADERS where
    // only a CONTINUATION may appear.
    stream
        .write_all(&FrameCodec::encode_frame(&Frame::Headers(
            HeadersFrame::new(1, Bytes::new(), false, false),
        )))
        .unwrap();
    stream
        .write_all(&request_headers(3, "GET", "/", true))
        .unwrap();

    expect_goaway(&mut stream, ErrorCode::ProtocolError);
}

#[test]
fn test_headers_with_continuation_accepted() {
    let addr = start_server();
    let mut stream = open_prior_knowledge(addr);

    let head = Encoder::new().encode(&[
        Header::new(":method", "GET"),
        Header::new(":path", "/"),
    ]);
    let rest = Encoder::new().encode(&[
        Header::new(":scheme", "http"),
        Header::new(":authority", "localhost:8080"),
    ]);

    stream
        .write_all(&FrameCodec::encode_frame(&Frame::Headers(
            HeadersFrame::new(1, head, true, false),
        )))
        .unwrap();
    stream
        .write_all(&FrameCodec::encode_frame(&Frame::Continuation(
            ContinuationFrame {
                stream_id: 1,
                block_fragment: rest,
                end_headers: true,
            },
        )))
        .unwrap();

    let (status, body) = read_response(&mut stream, 1);
    assert_eq!(status, "200");
    assert_eq!(body, b"Hello");
}

#[test]
fn test_oversize_data_is_frame_size_error() {
    let addr = start_server();
    let mut stream = open_prior_knowledge(addr);

    // A DATA header claiming 20000 octets; the default MAX_FRAME_SIZE
    // is 16384, so the server rejects on the header alone.
    let header = FrameCodec::encode_header(FrameType::Data, FrameFlags::empty(), 1, 20_000);
    stream.write_all(&header).unwrap();

    expect_goaway(&mut stream, ErrorCode::FrameSizeError);
}

#[test]
fn test_ping_roundtrip() {
    let addr = start_server();
    let mut stream = open_prior_knowledge(addr);

    let opaque = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
    stream
        .write_all(&FrameCodec::encode_frame(&Frame::Ping(PingFrame {
            ack: false,
            opaque,
        })))
        .unwrap();

    match read_frame(&mut stream) {
        Frame::Ping(ping) => {
            assert!(ping.ack);
            assert_eq!(ping.opaque, opaque);
        }
        other => panic!("expected PING ACK, got {:?}", other),
    }
}

#[test]
fn test_even_stream_id_is_protocol_error() {
    let addr = start_server();
    let mut stream = open_prior_knowledge(addr);

    stream
        .write_all(&request_headers(2, "GET", "/", true))
        .unwrap();

    expect_goaway(&mut stream, ErrorCode::ProtocolError);
}

#[test]
fn test_data_for_unknown_low_stream_is_stream_closed() {
    let addr = start_server();
    let mut stream = open_prior_knowledge(addr);

    // Stream 3 raises the high-water mark; stream 1 was never opened.
    stream
        .write_all(&request_headers(3, "GET", "/", true))
        .unwrap();
    stream
        .write_all(&FrameCodec::encode_frame(&Frame::Data(DataFrame::new(
            1,
            Bytes::from_static(b"stray"),
            true,
        ))))
        .unwrap();

    expect_goaway(&mut stream, ErrorCode::StreamClosed);
}

#[test]
fn test_data_after_half_close_gets_rst_stream() {
    let addr = start_server();
    let mut stream = open_prior_knowledge(addr);

    // The slow handler keeps stream 1 alive while the late DATA races
    // in after END_STREAM.
    stream
        .write_all(&request_headers(1, "GET", "/slow", true))
        .unwrap();
    stream
        .write_all(&FrameCodec::encode_frame(&Frame::Data(DataFrame::new(
            1,
            Bytes::from_static(b"late"),
            false,
        ))))
        .unwrap();

    loop {
        match read_frame(&mut stream) {
            Frame::RstStream(rst) => {
                assert_eq!(rst.stream_id, 1);
                assert_eq!(rst.error_code, ErrorCode::StreamClosed);
                break;
            }
            Frame::Settings(_) => {}
            other => panic!("expected RST_STREAM, got {:?}", other),
        }
    }
}

#[test]
fn test_window_update_and_priority_tolerated() {
    let addr = start_server();
    let mut stream = open_prior_knowledge(addr);

    stream
        .write_all(&FrameCodec::encode_frame(&Frame::WindowUpdate(
            WindowUpdateFrame {
                stream_id: 0,
                size_increment: 1024,
            },
        )))
        .unwrap();
    stream
        .write_all(&request_headers(1, "GET", "/", false))
        .unwrap();
    stream
        .write_all(&FrameCodec::encode_frame(&Frame::Priority(
            PriorityFrame {
                stream_id: 1,
                priority: PrioritySpec {
                    exclusive: false,
                    stream_dependency: 0,
                    weight: 10,
                },
            },
        )))
        .unwrap();
    stream
        .write_all(&FrameCodec::encode_frame(&Frame::Data(DataFrame::new(
            1,
            Bytes::new(),
            true,
        ))))
        .unwrap();

    // The request still completes normally.
    let (status, body) = read_response(&mut stream, 1);
    assert_eq!(status, "200");
    assert_eq!(body, b"Hello");
}

#[test]
fn test_upgrade_post_body_reaches_handler() {
    let addr = start_server();
    let mut stream = connect(addr);

    stream
        .write_all(
            b"POST /submit HTTP/1.1\r\nHost: localhost:8080\r\nUpgrade: h2c\r\nHTTP2-Settings: AAMAAABkAAQAoAAAAAIAAAAA\r\nContent-Length: 9\r\n\r\nsome body",
        )
        .unwrap();
    stream.write_all(CONNECTION_PREFACE).unwrap();

    let mut switch = vec![0u8; SWITCHING_PROTOCOLS.len()];
    stream.read_exact(&mut switch).unwrap();
    assert_eq!(switch, SWITCHING_PROTOCOLS);

    match read_frame(&mut stream) {
        Frame::Settings(_) => {}
        other => panic!("expected SETTINGS, got {:?}", other),
    }

    let (status, body) = read_response(&mut stream, 1);
    assert_eq!(status, "200");
    assert_eq!(body, b"received 9 bytes");
}
