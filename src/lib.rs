//! h2c - a cleartext HTTP/2 server engine
//!
//! This crate implements the wire-level core of an HTTP/2 server over
//! plaintext TCP: the h2c upgrade handshake, frame parsing and emission,
//! HPACK header compression, and per-stream state machines that dispatch
//! requests to an application-supplied handler.

pub mod h2;
pub mod hpack;
pub mod http11;

pub use h2::connection::Connection;
pub use h2::request::{Handler, Request, ResponseWriter};
