//! HPACK header block decoder (RFC 7541 Section 3)
//!
//! Each header field representation is selected by the high bits of its
//! first octet:
//!
//! | Pattern    | Representation                     | Prefix |
//! |------------|------------------------------------|--------|
//! | `1xxxxxxx` | indexed header field               | 7      |
//! | `01xxxxxx` | literal with incremental indexing  | 6      |
//! | `001xxxxx` | dynamic table size update          | 5      |
//! | `0001xxxx` | literal never indexed              | 4      |
//! | `0000xxxx` | literal without indexing           | 4      |

use super::integer::decode_int;
use super::table::IndexTable;
use super::{huffman, DecodeError, Header, Result};

/// Read one string literal: a length-prefixed body, Huffman-coded when
/// the high bit of the first octet is set.
fn read_string_literal(buf: &mut &[u8]) -> Result<String> {
    let huffman_coded = buf.first().ok_or(DecodeError::UnexpectedEnd)? & 0x80 != 0;
    let len = decode_int(buf, 7)? as usize;
    if buf.len() < len {
        return Err(DecodeError::UnexpectedEnd);
    }
    let body = &buf[..len];
    let s = if huffman_coded {
        huffman::decode(body)?
    } else {
        String::from_utf8_lossy(body).into_owned()
    };
    *buf = &buf[len..];
    Ok(s)
}

/// Stateful header block decoder.
///
/// Owns the connection's index table; incremental-indexing literals and
/// size updates mutate it, so blocks must be decoded in arrival order.
pub struct Decoder {
    table: IndexTable,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            table: IndexTable::new(),
        }
    }

    /// Read a literal field body: a nonzero index reuses that entry's
    /// name, index 0 is followed by a name literal; the value is always a
    /// string literal.
    fn read_literal(&self, buf: &mut &[u8], index: usize) -> Result<Header> {
        if index > 0 {
            let entry = self.table.get(index)?;
            let value = read_string_literal(buf)?;
            Ok(Header::new(entry.name, value))
        } else {
            let name = read_string_literal(buf)?;
            let value = read_string_literal(buf)?;
            Ok(Header::new(name, value))
        }
    }

    /// Decode a complete header block into an ordered field list.
    pub fn decode(&mut self, block: &[u8]) -> Result<Vec<Header>> {
        let mut buf = block;
        let mut headers = Vec::new();

        while !buf.is_empty() {
            let field = buf[0];

            if field & 0x80 != 0 {
                // Indexed header field
                let index = decode_int(&mut buf, 7)? as usize;
                headers.push(self.table.get(index)?);
            } else if field & 0xc0 == 0x40 {
                // Literal with incremental indexing
                let index = decode_int(&mut buf, 6)? as usize;
                let header = self.read_literal(&mut buf, index)?;
                self.table.add(header.clone());
                headers.push(header);
            } else if field & 0xe0 == 0x20 {
                // Dynamic table size update, only valid before the first
                // field of the block (RFC 7541 Section 4.2)
                if !headers.is_empty() {
                    return Err(DecodeError::MisplacedSizeUpdate);
                }
                let size = decode_int(&mut buf, 5)? as usize;
                self.table.update_max_size(size);
            } else {
                // Literal without indexing (0000xxxx) or never indexed
                // (0001xxxx)
                let never_indexed = field & 0xf0 == 0x10;
                let index = decode_int(&mut buf, 4)? as usize;
                let mut header = self.read_literal(&mut buf, index)?;
                header.never_indexed = never_indexed;
                headers.push(header);
            }
        }

        Ok(headers)
    }

    /// The decoder's index table, exposed for inspection in tests.
    pub fn table(&self) -> &IndexTable {
        &self.table
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_indexed_static_fields() {
        let mut decoder = Decoder::new();
        // :method: GET, :scheme: http, :path: /
        let headers = decoder.decode(&[0x82, 0x86, 0x84]).unwrap();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[0], Header::new(":method", "GET"));
        assert_eq!(headers[1], Header::new(":scheme", "http"));
        assert_eq!(headers[2], Header::new(":path", "/"));
    }

    #[test]
    fn test_decode_indexed_zero_is_error() {
        let mut decoder = Decoder::new();
        assert!(matches!(
            decoder.decode(&[0x80]),
            Err(DecodeError::InvalidIndex(0))
        ));
    }

    #[test]
    fn test_decode_literal_without_indexing_new_name() {
        let mut decoder = Decoder::new();
        let block = [
            0x00, // literal without indexing, index 0
            0x06, b'c', b'u', b's', b't', b'o', b'm', // name
            0x05, b'v', b'a', b'l', b'u', b'e', // value
        ];
        let headers = decoder.decode(&block).unwrap();
        assert_eq!(headers, vec![Header::new("custom", "value")]);
        // Nothing entered the dynamic table.
        assert_eq!(decoder.table().dynamic_len(), 0);
    }

    #[test]
    fn test_decode_never_indexed_sets_flag() {
        let mut decoder = Decoder::new();
        let block = [
            0x10, // literal never indexed, index 0
            0x06, b's', b'e', b'c', b'r', b'e', b't', // name
            0x01, b'x', // value
        ];
        let headers = decoder.decode(&block).unwrap();
        assert_eq!(headers.len(), 1);
        assert!(headers[0].never_indexed);
        assert_eq!(headers[0].name, "secret");
    }

    #[test]
    fn test_decode_incremental_indexing_populates_table() {
        let mut decoder = Decoder::new();
        let block = [
            0x40, // literal with incremental indexing, index 0
            0x04, b'x', b'-', b'i', b'd', // name
            0x03, b'a', b'b', b'c', // value
        ];
        let headers = decoder.decode(&block).unwrap();
        assert_eq!(headers, vec![Header::new("x-id", "abc")]);
        assert_eq!(decoder.table().dynamic_len(), 1);

        // A later block can address the new entry at index 62.
        let headers = decoder.decode(&[0xbe]).unwrap();
        assert_eq!(headers, vec![Header::new("x-id", "abc")]);
    }

    #[test]
    fn test_decode_literal_name_from_static_index() {
        let mut decoder = Decoder::new();
        // Index 28 (content-length) with a raw value
        let block = [0x0f, 0x0d, 0x02, b'4', b'2'];
        let headers = decoder.decode(&block).unwrap();
        assert_eq!(headers, vec![Header::new("content-length", "42")]);
    }

    #[test]
    fn test_size_update_at_block_start() {
        let mut decoder = Decoder::new();
        decoder
            .decode(&[
                0x40, 0x03, b'x', b'-', b'a', 0x01, b'1', // enters the table
            ])
            .unwrap();
        assert_eq!(decoder.table().dynamic_len(), 1);

        // Size update to 0 at the start of the next block empties it.
        decoder.decode(&[0x20]).unwrap();
        assert_eq!(decoder.table().dynamic_len(), 0);
    }

    #[test]
    fn test_size_update_mid_block_rejected() {
        let mut decoder = Decoder::new();
        let block = [0x82, 0x20];
        assert!(matches!(
            decoder.decode(&block),
            Err(DecodeError::MisplacedSizeUpdate)
        ));
    }

    #[test]
    fn test_truncated_literal_rejected() {
        let mut decoder = Decoder::new();
        // Claims a 6-octet name, provides 2
        let block = [0x00, 0x06, b'a', b'b'];
        assert!(matches!(
            decoder.decode(&block),
            Err(DecodeError::UnexpectedEnd)
        ));
    }
}
