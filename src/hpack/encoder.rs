//! HPACK header block encoder
//!
//! Emits every field as a literal without indexing with raw (non-Huffman)
//! strings. This is the smallest representation a compliant peer must
//! accept: nothing touches the peer's dynamic table, so the encoder
//! carries no state of its own. Indexed and Huffman-coded output is
//! follow-up work.

use super::integer::encode_int;
use super::Header;
use bytes::{BufMut, Bytes, BytesMut};

fn put_string_literal(buf: &mut BytesMut, s: &str) {
    encode_int(buf, 0, 7, s.len() as u32);
    buf.put_slice(s.as_bytes());
}

/// Header block encoder.
pub struct Encoder;

impl Encoder {
    pub fn new() -> Self {
        Encoder
    }

    /// Encode a header list into a block that decodes back to the same
    /// sequence under any RFC 7541 decoder.
    pub fn encode(&mut self, headers: &[Header]) -> Bytes {
        let mut buf = BytesMut::new();
        for header in headers {
            // Literal without indexing, index 0
            buf.put_u8(0x00);
            put_string_literal(&mut buf, &header.name);
            put_string_literal(&mut buf, &header.value);
        }
        buf.freeze()
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
