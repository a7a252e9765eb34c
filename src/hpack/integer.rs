//! Prefix-coded integers (RFC 7541 Section 5.1)
//!
//! An integer is packed into the low N bits of its first octet; values
//! that do not fit continue as 7-bit groups with a continuation bit.

use super::{DecodeError, Result};
use bytes::{BufMut, BytesMut};

/// Decode a prefix-coded integer, consuming octets from the cursor.
///
/// `prefix` is the number of low bits available in the first octet
/// (4..=8 for the representations this crate decodes). Values are capped
/// at `u32`; longer encodings fail with [`DecodeError::IntegerOverflow`].
pub fn decode_int(buf: &mut &[u8], prefix: u8) -> Result<u32> {
    debug_assert!((1..=8).contains(&prefix));

    let first = *buf.first().ok_or(DecodeError::UnexpectedEnd)?;
    *buf = &buf[1..];

    let mask: u32 = (1 << prefix) - 1;
    let prefix_value = u32::from(first) & mask;
    if prefix_value < mask {
        return Ok(prefix_value);
    }

    let mut value = u64::from(mask);
    let mut shift = 0u32;
    loop {
        let oct = *buf.first().ok_or(DecodeError::UnexpectedEnd)?;
        *buf = &buf[1..];

        if shift > 28 {
            return Err(DecodeError::IntegerOverflow);
        }
        value += u64::from(oct & 0x7f) << shift;
        if value > u64::from(u32::MAX) {
            return Err(DecodeError::IntegerOverflow);
        }

        if oct & 0x80 == 0 {
            return Ok(value as u32);
        }
        shift += 7;
    }
}

/// Encode a prefix-coded integer.
///
/// `head` carries the representation's pattern bits above the prefix; the
/// value is or-ed into the low `prefix` bits of the first octet.
pub fn encode_int(buf: &mut BytesMut, head: u8, prefix: u8, value: u32) {
    debug_assert!((1..=8).contains(&prefix));

    let mask: u32 = (1 << prefix) - 1;
    if value < mask {
        buf.put_u8(head | value as u8);
        return;
    }

    buf.put_u8(head | mask as u8);
    let mut rest = value - mask;
    loop {
        if rest >= 0x80 {
            buf.put_u8(0x80 | (rest & 0x7f) as u8);
            rest >>= 7;
        } else {
            buf.put_u8(rest as u8);
            return;
        }
    }
}
