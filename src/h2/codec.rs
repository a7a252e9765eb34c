//! HTTP/2 frame encoding and decoding
//!
//! The wire format per RFC 7540 Section 4.1:
//!
//! ```text
//! +-----------------------------------------------+
//! |                 Length (24)                   |
//! +---------------+---------------+---------------+
//! |   Type (8)    |   Flags (8)   |
//! +-+-------------+---------------+-------------------------------+
//! |R|                 Stream Identifier (31)                      |
//! +=+=============================================================+
//! |                   Frame Payload (0...)                      ...
//! +---------------------------------------------------------------+
//! ```

use super::error::{Error, ErrorCode, Result};
use super::frames::*;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Read;

/// HTTP/2 frame header size (9 octets)
pub const FRAME_HEADER_SIZE: usize = 9;

/// Largest representable payload (24-bit length field)
pub const MAX_FRAME_LEN: usize = 0x00FF_FFFF;

/// Decoded 9-octet frame header. The type octet is kept raw so unknown
/// types survive until the connection decides to skip them.
#[derive(Debug, Clone, Copy)]
pub struct FrameHeader {
    pub length: usize,
    pub frame_type: u8,
    pub flags: FrameFlags,
    pub stream_id: u32,
}

/// Frame codec: stateless encode/decode entry points.
pub struct FrameCodec;

impl FrameCodec {
    /// Encode a frame header.
    pub fn encode_header(
        frame_type: FrameType,
        flags: FrameFlags,
        stream_id: u32,
        length: usize,
    ) -> [u8; FRAME_HEADER_SIZE] {
        let mut header = [0u8; FRAME_HEADER_SIZE];

        header[0] = ((length >> 16) & 0xFF) as u8;
        header[1] = ((length >> 8) & 0xFF) as u8;
        header[2] = (length & 0xFF) as u8;
        header[3] = frame_type.as_u8();
        header[4] = flags.as_u8();

        // Reserved bit is always 0 on the wire
        let stream_id = stream_id & 0x7FFF_FFFF;
        header[5..9].copy_from_slice(&stream_id.to_be_bytes());

        header
    }

    /// Decode a frame header.
    pub fn decode_header(bytes: &[u8; FRAME_HEADER_SIZE]) -> FrameHeader {
        let length =
            ((bytes[0] as usize) << 16) | ((bytes[1] as usize) << 8) | (bytes[2] as usize);
        let stream_id =
            u32::from_be_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]) & 0x7FFF_FFFF;

        FrameHeader {
            length,
            frame_type: bytes[3],
            flags: FrameFlags::from_u8(bytes[4]),
            stream_id,
        }
    }

    /// Read one frame off the transport.
    ///
    /// DATA and HEADERS payloads larger than `max_frame_size` fail as
    /// [`Error::FrameSize`] before the payload is read; any other short
    /// read is an I/O error. Unknown type codes consume their payload and
    /// yield [`Error::UnknownFrame`] so the caller can skip them without
    /// losing frame sync.
    pub fn read_frame<R: Read>(reader: &mut R, max_frame_size: u32) -> Result<Frame> {
        let mut header_bytes = [0u8; FRAME_HEADER_SIZE];
        reader.read_exact(&mut header_bytes)?;
        let header = Self::decode_header(&header_bytes);

        match FrameType::from_u8(header.frame_type) {
            Some(FrameType::Data) | Some(FrameType::Headers)
                if header.length > max_frame_size as usize =>
            {
                return Err(Error::FrameSize(format!(
                    "{} byte payload exceeds MAX_FRAME_SIZE {}",
                    header.length, max_frame_size
                )));
            }
            _ => {}
        }

        let mut payload = vec![0u8; header.length];
        reader.read_exact(&mut payload)?;

        Self::decode_payload(header, Bytes::from(payload))
    }

    /// Decode a typed frame from its header and payload.
    pub fn decode_payload(header: FrameHeader, payload: Bytes) -> Result<Frame> {
        let frame_type = FrameType::from_u8(header.frame_type)
            .ok_or(Error::UnknownFrame(header.frame_type))?;

        match frame_type {
            FrameType::Data => Self::decode_data(header, payload),
            FrameType::Headers => Self::decode_headers(header, payload),
            FrameType::Priority => Self::decode_priority(header, payload),
            FrameType::RstStream => Self::decode_rst_stream(header, payload),
            FrameType::Settings => Self::decode_settings(header, payload),
            FrameType::Ping => Self::decode_ping(header, payload),
            FrameType::Goaway => Self::decode_goaway(header, payload),
            FrameType::WindowUpdate => Self::decode_window_update(header, payload),
            FrameType::Continuation => Self::decode_continuation(header, payload),
            FrameType::PushPromise => Err(Error::UnknownFrame(header.frame_type)),
        }
    }

    fn strip_padding(payload: Bytes, padded: bool, what: &str) -> Result<Bytes> {
        if !padded {
            return Ok(payload);
        }
        let mut payload = payload;
        if payload.is_empty() {
            return Err(Error::FrameSize(format!("{}: missing pad length", what)));
        }
        let pad_len = payload.get_u8() as usize;
        if pad_len > payload.len() {
            return Err(Error::Protocol(format!(
                "{}: padding {} exceeds payload {}",
                what,
                pad_len,
                payload.len()
            )));
        }
        payload.truncate(payload.len() - pad_len);
        Ok(payload)
    }

    fn decode_data(header: FrameHeader, payload: Bytes) -> Result<Frame> {
        let data = Self::strip_padding(payload, header.flags.is_padded(), "DATA")?;
        Ok(Frame::Data(DataFrame {
            stream_id: header.stream_id,
            data,
            end_stream: header.flags.is_end_stream(),
            padding: None,
        }))
    }

    fn decode_headers(header: FrameHeader, payload: Bytes) -> Result<Frame> {
        let mut payload = Self::strip_padding(payload, header.flags.is_padded(), "HEADERS")?;

        let priority = if header.flags.is_priority() {
            if payload.len() < 5 {
                return Err(Error::FrameSize(
                    "HEADERS: truncated priority fields".to_string(),
                ));
            }
            let dep = payload.get_u32();
            let weight = payload.get_u8();
            Some(PrioritySpec {
                exclusive: dep & 0x8000_0000 != 0,
                stream_dependency: dep & 0x7FFF_FFFF,
                weight,
            })
        } else {
            None
        };

        Ok(Frame::Headers(HeadersFrame {
            stream_id: header.stream_id,
            block_fragment: payload,
            end_stream: header.flags.is_end_stream(),
            end_headers: header.flags.is_end_headers(),
            priority,
            padding: None,
            headers: Vec::new(),
        }))
    }

    fn decode_priority(header: FrameHeader, mut payload: Bytes) -> Result<Frame> {
        if payload.len() != 5 {
            return Err(Error::FrameSize(format!(
                "PRIORITY payload must be 5 octets, got {}",
                payload.len()
            )));
        }
        let dep = payload.get_u32();
        let weight = payload.get_u8();
        Ok(Frame::Priority(PriorityFrame {
            stream_id: header.stream_id,
            priority: PrioritySpec {
                exclusive: dep & 0x8000_0000 != 0,
                stream_dependency: dep & 0x7FFF_FFFF,
                weight,
            },
        }))
    }

    fn decode_rst_stream(header: FrameHeader, mut payload: Bytes) -> Result<Frame> {
        if payload.len() != 4 {
            return Err(Error::FrameSize(format!(
                "RST_STREAM payload must be 4 octets, got {}",
                payload.len()
            )));
        }
        Ok(Frame::RstStream(RstStreamFrame {
            stream_id: header.stream_id,
            error_code: ErrorCode::from_u32(payload.get_u32()),
        }))
    }

    fn decode_settings(header: FrameHeader, mut payload: Bytes) -> Result<Frame> {
        if payload.len() % 6 != 0 {
            return Err(Error::FrameSize(format!(
                "SETTINGS payload must be a multiple of 6 octets, got {}",
                payload.len()
            )));
        }
        let mut entries = Vec::with_capacity(payload.len() / 6);
        while payload.has_remaining() {
            entries.push(SettingEntry {
                id: payload.get_u16(),
                value: payload.get_u32(),
            });
        }
        Ok(Frame::Settings(SettingsFrame {
            ack: header.flags.is_ack(),
            entries,
        }))
    }

    fn decode_ping(header: FrameHeader, payload: Bytes) -> Result<Frame> {
        if payload.len() != 8 {
            return Err(Error::FrameSize(format!(
                "PING payload must be 8 octets, got {}",
                payload.len()
            )));
        }
        let mut opaque = [0u8; 8];
        opaque.copy_from_slice(&payload);
        Ok(Frame::Ping(PingFrame {
            ack: header.flags.is_ack(),
            opaque,
        }))
    }

    fn decode_goaway(_header: FrameHeader, mut payload: Bytes) -> Result<Frame> {
        if payload.len() < 8 {
            return Err(Error::FrameSize(format!(
                "GOAWAY payload must be at least 8 octets, got {}",
                payload.len()
            )));
        }
        let last_stream_id = payload.get_u32() & 0x7FFF_FFFF;
        let error_code = ErrorCode::from_u32(payload.get_u32());
        Ok(Frame::Goaway(GoawayFrame {
            last_stream_id,
            error_code,
            debug_data: payload,
        }))
    }

    fn decode_window_update(header: FrameHeader, mut payload: Bytes) -> Result<Frame> {
        if payload.len() != 4 {
            return Err(Error::FrameSize(format!(
                "WINDOW_UPDATE payload must be 4 octets, got {}",
                payload.len()
            )));
        }
        Ok(Frame::WindowUpdate(WindowUpdateFrame {
            stream_id: header.stream_id,
            size_increment: payload.get_u32() & 0x7FFF_FFFF,
        }))
    }

    fn decode_continuation(header: FrameHeader, payload: Bytes) -> Result<Frame> {
        Ok(Frame::Continuation(ContinuationFrame {
            stream_id: header.stream_id,
            block_fragment: payload,
            end_headers: header.flags.is_end_headers(),
        }))
    }

    /// Encode a frame into header + payload wire bytes.
    ///
    /// HEADERS frames are encoded from their `block_fragment`; the
    /// connection writer fills that in from the header list first.
    pub fn encode_frame(frame: &Frame) -> Bytes {
        match frame {
            Frame::Data(f) => Self::encode_data(f),
            Frame::Headers(f) => Self::encode_headers(f),
            Frame::Priority(f) => Self::encode_priority(f),
            Frame::RstStream(f) => Self::encode_rst_stream(f),
            Frame::Settings(f) => Self::encode_settings(f),
            Frame::Ping(f) => Self::encode_ping(f),
            Frame::Goaway(f) => Self::encode_goaway(f),
            Frame::WindowUpdate(f) => Self::encode_window_update(f),
            Frame::Continuation(f) => Self::encode_continuation(f),
        }
    }

    fn encode_data(frame: &DataFrame) -> Bytes {
        let mut flags = FrameFlags::empty();
        if frame.end_stream {
            flags.set(FrameFlags::END_STREAM);
        }

        let pad_len = frame.padding.unwrap_or(0) as usize;
        let mut payload_len = frame.data.len();
        if frame.padding.is_some() {
            flags.set(FrameFlags::PADDED);
            payload_len += 1 + pad_len;
        }

        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload_len);
        buf.put_slice(&Self::encode_header(
            FrameType::Data,
            flags,
            frame.stream_id,
            payload_len,
        ));
        if frame.padding.is_some() {
            buf.put_u8(pad_len as u8);
        }
        buf.put_slice(&frame.data);
        buf.put_bytes(0, pad_len);
        buf.freeze()
    }

    fn encode_headers(frame: &HeadersFrame) -> Bytes {
        let mut flags = FrameFlags::empty();
        if frame.end_stream {
            flags.set(FrameFlags::END_STREAM);
        }
        if frame.end_headers {
            flags.set(FrameFlags::END_HEADERS);
        }

        let pad_len = frame.padding.unwrap_or(0) as usize;
        let mut payload_len = frame.block_fragment.len();
        if frame.padding.is_some() {
            flags.set(FrameFlags::PADDED);
            payload_len += 1 + pad_len;
        }
        if frame.priority.is_some() {
            flags.set(FrameFlags::PRIORITY);
            payload_len += 5;
        }

        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload_len);
        buf.put_slice(&Self::encode_header(
            FrameType::Headers,
            flags,
            frame.stream_id,
            payload_len,
        ));
        if frame.padding.is_some() {
            buf.put_u8(pad_len as u8);
        }
        if let Some(priority) = &frame.priority {
            let mut dep = priority.stream_dependency & 0x7FFF_FFFF;
            if priority.exclusive {
                dep |= 0x8000_0000;
            }
            buf.put_u32(dep);
            buf.put_u8(priority.weight);
        }
        buf.put_slice(&frame.block_fragment);
        buf.put_bytes(0, pad_len);
        buf.freeze()
    }

    fn encode_priority(frame: &PriorityFrame) -> Bytes {
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + 5);
        buf.put_slice(&Self::encode_header(
            FrameType::Priority,
            FrameFlags::empty(),
            frame.stream_id,
            5,
        ));
        let mut dep = frame.priority.stream_dependency & 0x7FFF_FFFF;
        if frame.priority.exclusive {
            dep |= 0x8000_0000;
        }
        buf.put_u32(dep);
        buf.put_u8(frame.priority.weight);
        buf.freeze()
    }

    fn encode_rst_stream(frame: &RstStreamFrame) -> Bytes {
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + 4);
        buf.put_slice(&Self::encode_header(
            FrameType::RstStream,
            FrameFlags::empty(),
            frame.stream_id,
            4,
        ));
        buf.put_u32(frame.error_code.as_u32());
        buf.freeze()
    }

    fn encode_settings(frame: &SettingsFrame) -> Bytes {
        let flags = if frame.ack {
            FrameFlags::from_u8(FrameFlags::ACK)
        } else {
            FrameFlags::empty()
        };
        let payload_len = frame.entries.len() * 6;

        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload_len);
        buf.put_slice(&Self::encode_header(
            FrameType::Settings,
            flags,
            0,
            payload_len,
        ));
        for entry in &frame.entries {
            buf.put_u16(entry.id);
            buf.put_u32(entry.value);
        }
        buf.freeze()
    }

    fn encode_ping(frame: &PingFrame) -> Bytes {
        let flags = if frame.ack {
            FrameFlags::from_u8(FrameFlags::ACK)
        } else {
            FrameFlags::empty()
        };
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + 8);
        buf.put_slice(&Self::encode_header(FrameType::Ping, flags, 0, 8));
        buf.put_slice(&frame.opaque);
        buf.freeze()
    }

    fn encode_goaway(frame: &GoawayFrame) -> Bytes {
        let payload_len = 8 + frame.debug_data.len();
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload_len);
        buf.put_slice(&Self::encode_header(
            FrameType::Goaway,
            FrameFlags::empty(),
            0,
            payload_len,
        ));
        buf.put_u32(frame.last_stream_id & 0x7FFF_FFFF);
        buf.put_u32(frame.error_code.as_u32());
        buf.put_slice(&frame.debug_data);
        buf.freeze()
    }

    fn encode_window_update(frame: &WindowUpdateFrame) -> Bytes {
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + 4);
        buf.put_slice(&Self::encode_header(
            FrameType::WindowUpdate,
            FrameFlags::empty(),
            frame.stream_id,
            4,
        ));
        buf.put_u32(frame.size_increment & 0x7FFF_FFFF);
        buf.freeze()
    }

    fn encode_continuation(frame: &ContinuationFrame) -> Bytes {
        let mut flags = FrameFlags::empty();
        if frame.end_headers {
            flags.set(FrameFlags::END_HEADERS);
        }
        let mut buf =
            BytesMut::with_capacity(FRAME_HEADER_SIZE + frame.block_fragment.len());
        buf.put_slice(&Self::encode_header(
            FrameType::Continuation,
            flags,
            frame.stream_id,
            frame.block_fragment.len(),
        ));
        buf.put_slice(&frame.block_fragment);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reparse(wire: &Bytes) -> Frame {
        let mut cursor = &wire[..];
        FrameCodec::read_frame(&mut cursor, 16384).unwrap()
    }

    #[test]
    fn test_header_roundtrip() {
        let mut flags = FrameFlags::empty();
        flags.set(FrameFlags::END_STREAM);
        flags.set(FrameFlags::END_HEADERS);

        let wire = FrameCodec::encode_header(FrameType::Headers, flags, 42, 1234);
        let header = FrameCodec::decode_header(&wire);

        assert_eq!(header.frame_type, FrameType::Headers.as_u8());
        assert_eq!(header.flags.as_u8(), flags.as_u8());
        assert_eq!(header.stream_id, 42);
        assert_eq!(header.length, 1234);
    }

    #[test]
    fn test_reserved_bit_masked() {
        let wire = FrameCodec::encode_header(
            FrameType::Data,
            FrameFlags::empty(),
            0xFFFF_FFFF,
            0,
        );
        assert_eq!(wire[5], 0x7F);
        let header = FrameCodec::decode_header(&wire);
        assert_eq!(header.stream_id, 0x7FFF_FFFF);
    }

    #[test]
    fn test_data_frame_wire_layout() {
        let frame = DataFrame::new(1, Bytes::from_static(b"Hello"), true);
        let wire = FrameCodec::encode_frame(&Frame::Data(frame));

        assert_eq!(&wire[0..3], &[0, 0, 5]);
        assert_eq!(wire[3], FrameType::Data.as_u8());
        assert_eq!(wire[4], FrameFlags::END_STREAM);
        assert_eq!(&wire[5..9], &[0, 0, 0, 1]);
        assert_eq!(&wire[9..], b"Hello");
    }

    #[test]
    fn test_data_frame_roundtrip() {
        let frame = DataFrame::new(3, Bytes::from_static(b"payload"), false);
        let wire = FrameCodec::encode_frame(&Frame::Data(frame.clone()));
        assert_eq!(reparse(&wire), Frame::Data(frame));
    }

    #[test]
    fn test_padded_data_decodes_to_bare_payload() {
        let mut frame = DataFrame::new(1, Bytes::from_static(b"Hi"), false);
        frame.padding = Some(10);
        let wire = FrameCodec::encode_frame(&Frame::Data(frame));

        // 1 pad-length octet + 2 data + 10 padding
        assert_eq!(&wire[0..3], &[0, 0, 13]);
        assert_eq!(wire[4] & FrameFlags::PADDED, FrameFlags::PADDED);
        assert_eq!(wire[9], 10);

        match reparse(&wire) {
            Frame::Data(decoded) => {
                assert_eq!(&decoded.data[..], b"Hi");
                assert_eq!(decoded.padding, None);
            }
            other => panic!("expected DATA, got {:?}", other),
        }
    }

    #[test]
    fn test_headers_frame_roundtrip() {
        let frame = HeadersFrame::new(5, Bytes::from_static(b"\x82\x86"), true, true);
        let wire = FrameCodec::encode_frame(&Frame::Headers(frame.clone()));
        assert_eq!(reparse(&wire), Frame::Headers(frame));
    }

    #[test]
    fn test_headers_priority_roundtrip() {
        let mut frame = HeadersFrame::new(5, Bytes::from_static(b"\x84"), false, true);
        frame.priority = Some(PrioritySpec {
            exclusive: true,
            stream_dependency: 3,
            weight: 200,
        });
        let wire = FrameCodec::encode_frame(&Frame::Headers(frame.clone()));
        assert_eq!(reparse(&wire), Frame::Headers(frame));
    }

    #[test]
    fn test_settings_roundtrip() {
        let frame = SettingsFrame {
            ack: false,
            entries: vec![
                SettingEntry { id: 0x3, value: 100 },
                SettingEntry { id: 0x4, value: 65535 },
            ],
        };
        let wire = FrameCodec::encode_frame(&Frame::Settings(frame.clone()));
        assert_eq!(&wire[0..3], &[0, 0, 12]);
        assert_eq!(&wire[5..9], &[0, 0, 0, 0]);
        assert_eq!(reparse(&wire), Frame::Settings(frame));
    }

    #[test]
    fn test_settings_ack_has_empty_payload() {
        let wire = FrameCodec::encode_frame(&Frame::Settings(SettingsFrame::ack()));
        assert_eq!(&wire[0..3], &[0, 0, 0]);
        assert_eq!(wire[4], FrameFlags::ACK);
    }

    #[test]
    fn test_ping_roundtrip() {
        let frame = PingFrame {
            ack: true,
            opaque: [1, 2, 3, 4, 5, 6, 7, 8],
        };
        let wire = FrameCodec::encode_frame(&Frame::Ping(frame));
        assert_eq!(reparse(&wire), Frame::Ping(frame));
    }

    #[test]
    fn test_goaway_roundtrip() {
        let frame = GoawayFrame {
            last_stream_id: 7,
            error_code: ErrorCode::ProtocolError,
            debug_data: Bytes::from_static(b"even stream id"),
        };
        let wire = FrameCodec::encode_frame(&Frame::Goaway(frame.clone()));
        assert_eq!(reparse(&wire), Frame::Goaway(frame));
    }

    #[test]
    fn test_window_update_roundtrip() {
        let frame = WindowUpdateFrame {
            stream_id: 3,
            size_increment: 2048,
        };
        let wire = FrameCodec::encode_frame(&Frame::WindowUpdate(frame));
        assert_eq!(reparse(&wire), Frame::WindowUpdate(frame));
    }

    #[test]
    fn test_rst_stream_roundtrip_and_coercion() {
        let frame = RstStreamFrame {
            stream_id: 9,
            error_code: ErrorCode::Cancel,
        };
        let wire = FrameCodec::encode_frame(&Frame::RstStream(frame));
        assert_eq!(reparse(&wire), Frame::RstStream(frame));

        // A code beyond 0xd on the wire decodes as INTERNAL_ERROR.
        let mut raw = FrameCodec::encode_frame(&Frame::RstStream(frame)).to_vec();
        raw[9..13].copy_from_slice(&0x99u32.to_be_bytes());
        let mut cursor = &raw[..];
        match FrameCodec::read_frame(&mut cursor, 16384).unwrap() {
            Frame::RstStream(decoded) => {
                assert_eq!(decoded.error_code, ErrorCode::InternalError)
            }
            other => panic!("expected RST_STREAM, got {:?}", other),
        }
    }

    #[test]
    fn test_continuation_roundtrip() {
        let frame = ContinuationFrame {
            stream_id: 1,
            block_fragment: Bytes::from_static(b"\x82"),
            end_headers: true,
        };
        let wire = FrameCodec::encode_frame(&Frame::Continuation(frame.clone()));
        assert_eq!(reparse(&wire), Frame::Continuation(frame));
    }

    #[test]
    fn test_oversize_data_rejected_before_payload() {
        let header = FrameCodec::encode_header(
            FrameType::Data,
            FrameFlags::empty(),
            1,
            20_000,
        );
        let mut cursor = &header[..];
        assert!(matches!(
            FrameCodec::read_frame(&mut cursor, 16384),
            Err(Error::FrameSize(_))
        ));
    }

    #[test]
    fn test_unknown_type_consumes_payload() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&[0, 0, 3, 0xAB, 0, 0, 0, 0, 0]);
        wire.extend_from_slice(b"xyz");
        // A PING follows; skipping the unknown frame must leave the
        // cursor aligned on it.
        wire.extend_from_slice(
            &FrameCodec::encode_frame(&Frame::Ping(PingFrame {
                ack: false,
                opaque: [0; 8],
            })),
        );

        let mut cursor = &wire[..];
        assert!(matches!(
            FrameCodec::read_frame(&mut cursor, 16384),
            Err(Error::UnknownFrame(0xAB))
        ));
        assert!(matches!(
            FrameCodec::read_frame(&mut cursor, 16384).unwrap(),
            Frame::Ping(_)
        ));
    }

    #[test]
    fn test_short_fixed_payloads_rejected() {
        // RST_STREAM with a 2-octet payload
        let mut wire = Vec::new();
        wire.extend_from_slice(&[0, 0, 2, 0x3, 0, 0, 0, 0, 1]);
        wire.extend_from_slice(&[0, 0]);
        let mut cursor = &wire[..];
        assert!(matches!(
            FrameCodec::read_frame(&mut cursor, 16384),
            Err(Error::FrameSize(_))
        ));
    }
}
