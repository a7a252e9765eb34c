//! HTTP/2 protocol engine
//!
//! Frame codec, settings, per-stream state machines, and the connection
//! loop that ties them to a handler. The engine serves cleartext HTTP/2
//! only: connections arrive either through the h2c upgrade dance or with
//! the client connection preface (prior knowledge).

pub mod codec;
pub mod connection;
pub mod error;
pub mod frames;
pub mod request;
pub mod settings;
pub mod stream;

pub use connection::Connection;
pub use error::{Error, ErrorCode, Result};
pub use frames::{Frame, FrameFlags, FrameType};
pub use request::{Handler, Request, ResponseWriter};
pub use settings::ConnectionSettings;
pub use stream::{StreamId, StreamState};

/// HTTP/2 connection preface sent by clients (RFC 7540 Section 3.5)
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Stream ID 0, the connection itself
pub const CONNECTION_STREAM_ID: u32 = 0;

/// Maximum stream ID value (2^31 - 1)
pub const MAX_STREAM_ID: u32 = 0x7FFF_FFFF;
