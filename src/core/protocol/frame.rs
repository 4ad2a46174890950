// src/core/protocol/frame.rs

//! Implements the RESP (REdis Serialization Protocol) frame structure and the
//! corresponding `Encoder` and `Decoder` for network communication.

use crate::core::KvNodeError;
use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

const CRLF: &[u8] = b"\r\n";
const CRLF_LEN: usize = 2;

// Protocol-level limits to prevent denial-of-service from malicious or malformed frames.
const MAX_FRAME_ELEMENTS: usize = 1_024 * 1_024;
const MAX_BULK_STRING_SIZE: usize = 512 * 1024 * 1024;

/// A single frame in the RESP protocol: the low-level representation of data
/// exchanged between a client/replica and this server.
///
/// The last eight variants are RESP3 additions. This server only ever speaks
/// RESP2 on the wire; they exist here purely so the decoder can recognize and
/// skip past them if a peer ever sends one, rather than treating the
/// connection as desynchronized.
#[derive(Debug, Clone, PartialEq)]
pub enum RespFrame {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    Null,
    NullArray,
    Array(Vec<RespFrame>),
    // RESP3 additions, recognized but never produced or acted upon.
    Map(Vec<(RespFrame, RespFrame)>),
    Set(Vec<RespFrame>),
    Boolean(bool),
    Double(f64),
    BigNumber(String),
    VerbatimString(String, Bytes),
    Attribute(Vec<(RespFrame, RespFrame)>, Box<RespFrame>),
    Push(Vec<RespFrame>),
    BulkError(Bytes),
}

impl RespFrame {
    /// Convenience constructor for the fixed `+OK\r\n` reply.
    pub fn ok() -> Self {
        RespFrame::SimpleString("OK".to_string())
    }

    /// Encodes this frame into a standalone `Vec<u8>`. Used by the
    /// replication core, which needs a complete byte vector rather than
    /// streaming through a `Framed` sink (e.g. for `REPLCONF GETACK`).
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, KvNodeError> {
        let mut buf = BytesMut::new();
        RespFrameCodec::new(2).encode(self.clone(), &mut buf)?;
        Ok(buf.to_vec())
    }
}

/// A `tokio_util::codec` implementation for encoding and decoding `RespFrame`s.
#[derive(Debug)]
pub struct RespFrameCodec {
    protocol_version: u8,
}

impl RespFrameCodec {
    pub fn new(protocol_version: u8) -> Self {
        Self { protocol_version }
    }

    fn require_resp3(&self, type_name: &str) -> Result<(), KvNodeError> {
        if self.protocol_version < 3 {
            Err(KvNodeError::Protocol(format!(
                "{type_name} type not supported in RESP2"
            )))
        } else {
            Ok(())
        }
    }
}

impl Default for RespFrameCodec {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Encoder<RespFrame> for RespFrameCodec {
    type Error = KvNodeError;

    fn encode(&mut self, item: RespFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            RespFrame::SimpleString(s) => {
                dst.extend_from_slice(b"+");
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Error(s) => {
                dst.extend_from_slice(b"-");
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Integer(i) => {
                dst.extend_from_slice(b":");
                dst.extend_from_slice(i.to_string().as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::BulkString(b) => {
                dst.extend_from_slice(b"$");
                dst.extend_from_slice(b.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                dst.extend_from_slice(&b);
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Null => dst.extend_from_slice(b"$-1\r\n"),
            RespFrame::NullArray => dst.extend_from_slice(b"*-1\r\n"),
            RespFrame::Array(arr) => {
                dst.extend_from_slice(b"*");
                dst.extend_from_slice(arr.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                for frame in arr {
                    self.encode(frame, dst)?;
                }
            }
            RespFrame::Map(map) => {
                self.require_resp3("Map")?;
                dst.extend_from_slice(b"%");
                dst.extend_from_slice(map.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                for (k, v) in map {
                    self.encode(k, dst)?;
                    self.encode(v, dst)?;
                }
            }
            RespFrame::Set(set) => {
                self.require_resp3("Set")?;
                dst.extend_from_slice(b"~");
                dst.extend_from_slice(set.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                for frame in set {
                    self.encode(frame, dst)?;
                }
            }
            RespFrame::Boolean(b) => {
                self.require_resp3("Boolean")?;
                dst.extend_from_slice(if b { b"#t" } else { b"#f" });
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Double(d) => {
                self.require_resp3("Double")?;
                dst.extend_from_slice(b",");
                dst.extend_from_slice(d.to_string().as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::BigNumber(bn) => {
                self.require_resp3("BigNumber")?;
                dst.extend_from_slice(b"(");
                dst.extend_from_slice(bn.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::VerbatimString(format, text) => {
                self.require_resp3("VerbatimString")?;
                dst.extend_from_slice(b"=");
                dst.extend_from_slice((text.len() + format.len() + 1).to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                dst.extend_from_slice(format.as_bytes());
                dst.extend_from_slice(b":");
                dst.extend_from_slice(&text);
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Attribute(attrs, data) => {
                self.require_resp3("Attribute")?;
                dst.extend_from_slice(b"|");
                dst.extend_from_slice(attrs.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                for (k, v) in attrs {
                    self.encode(k, dst)?;
                    self.encode(v, dst)?;
                }
                self.encode(*data, dst)?;
            }
            RespFrame::Push(items) => {
                self.require_resp3("Push")?;
                dst.extend_from_slice(b">");
                dst.extend_from_slice(items.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                for frame in items {
                    self.encode(frame, dst)?;
                }
            }
            RespFrame::BulkError(b) => {
                self.require_resp3("BulkError")?;
                dst.extend_from_slice(b"!");
                dst.extend_from_slice(b.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                dst.extend_from_slice(&b);
                dst.extend_from_slice(CRLF);
            }
        }
        Ok(())
    }
}

/// Decodes `RespFrame`s from a byte stream. In addition to the parsed value,
/// every decoded item carries the exact span of input bytes it came from —
/// the replication core needs those bytes verbatim for the stored write log,
/// and re-encoding the parsed value is not guaranteed to reproduce them
/// byte-for-byte.
impl Decoder for RespFrameCodec {
    type Item = (RespFrame, Bytes);
    type Error = KvNodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match parse_frame(src, self.protocol_version) {
            Ok((frame, len)) => {
                let raw = Bytes::copy_from_slice(&src[..len]);
                src.advance(len);
                Ok(Some((frame, raw)))
            }
            Err(KvNodeError::IncompleteFrame) => Ok(None),
            Err(e) => {
                // Drop the offending frame so the next `decode()` call makes
                // progress instead of re-parsing the same bytes forever (the
                // same discipline `tokio_util`'s `LinesCodec` uses on a
                // length-exceeded error). We don't generally know the exact
                // length of a malformed frame, so discard through the first
                // CRLF as a best-effort resync point, falling back to the
                // whole buffer if none is present yet.
                let discard = find_crlf(src).map(|pos| pos + CRLF_LEN).unwrap_or(src.len());
                src.advance(discard);
                Err(e)
            }
        }
    }
}

/// Inspects the first byte (the type prefix) and dispatches to the
/// appropriate parsing function, returning the parsed frame and the number of
/// bytes it consumed.
fn parse_frame(src: &[u8], protocol_version: u8) -> Result<(RespFrame, usize), KvNodeError> {
    if src.is_empty() {
        return Err(KvNodeError::IncompleteFrame);
    }
    match src[0] {
        b'+' => parse_simple_string(src),
        b'-' => parse_error(src),
        b':' => parse_integer(src),
        b'$' => parse_bulk_string(src),
        b'*' => parse_array(src, protocol_version),
        b'%' => parse_map(src, protocol_version),
        b'~' => parse_set(src, protocol_version),
        b'#' => parse_boolean(src),
        b',' => parse_double(src),
        b'(' => parse_big_number(src),
        b'=' => parse_verbatim_string(src),
        b'|' => parse_attribute(src, protocol_version),
        b'>' => parse_push(src, protocol_version),
        b'!' => parse_bulk_error(src),
        _ => Err(KvNodeError::Protocol(format!(
            "unrecognized type prefix '{}'",
            src[0] as char
        ))),
    }
}

fn find_crlf(src: &[u8]) -> Option<usize> {
    src.windows(CRLF_LEN).position(|window| window == CRLF)
}

fn parse_line(src: &[u8]) -> Result<(&[u8], usize), KvNodeError> {
    find_crlf(src)
        .map(|pos| (&src[..pos], pos + CRLF_LEN))
        .ok_or(KvNodeError::IncompleteFrame)
}

fn parse_simple_string(src: &[u8]) -> Result<(RespFrame, usize), KvNodeError> {
    let (line, len) = parse_line(&src[1..])?;
    Ok((
        RespFrame::SimpleString(String::from_utf8_lossy(line).to_string()),
        len + 1,
    ))
}

fn parse_error(src: &[u8]) -> Result<(RespFrame, usize), KvNodeError> {
    let (line, len) = parse_line(&src[1..])?;
    Ok((
        RespFrame::Error(String::from_utf8_lossy(line).to_string()),
        len + 1,
    ))
}

fn parse_integer(src: &[u8]) -> Result<(RespFrame, usize), KvNodeError> {
    let (line, len) = parse_line(&src[1..])?;
    let s = String::from_utf8_lossy(line);
    let i = s
        .parse::<i64>()
        .map_err(|_| KvNodeError::Protocol("invalid integer frame".to_string()))?;
    Ok((RespFrame::Integer(i), len + 1))
}

/// Shared by bulk string and bulk error parsing: both are `<len>\r\n<body>\r\n`
/// with `<len> == -1` meaning "null". Returns `None` for the null case.
fn parse_length_prefixed_body(
    src: &[u8],
    max_len: usize,
) -> Result<(Option<Bytes>, usize), KvNodeError> {
    let (line, len_of_line) = parse_line(&src[1..])?;
    let s = String::from_utf8_lossy(line);
    let declared_len = s
        .parse::<isize>()
        .map_err(|_| KvNodeError::Protocol("invalid length header".to_string()))?;

    if declared_len == -1 {
        return Ok((None, len_of_line + 1));
    }
    let declared_len = declared_len as usize;
    if declared_len > max_len {
        return Err(KvNodeError::Protocol("frame length exceeds limit".to_string()));
    }

    let prefix_len = len_of_line + 1;
    if src.len() < prefix_len + declared_len + CRLF_LEN {
        return Err(KvNodeError::IncompleteFrame);
    }
    if &src[prefix_len + declared_len..prefix_len + declared_len + CRLF_LEN] != CRLF {
        return Err(KvNodeError::Protocol(
            "bulk string missing trailing CRLF".to_string(),
        ));
    }

    let data = Bytes::copy_from_slice(&src[prefix_len..prefix_len + declared_len]);
    Ok((Some(data), prefix_len + declared_len + CRLF_LEN))
}

/// Parses a Bulk String (e.g. `$5\r\nhello\r\n`); `$-1\r\n` decodes to `Null`.
fn parse_bulk_string(src: &[u8]) -> Result<(RespFrame, usize), KvNodeError> {
    match parse_length_prefixed_body(src, MAX_BULK_STRING_SIZE)? {
        (Some(data), len) => Ok((RespFrame::BulkString(data), len)),
        (None, len) => Ok((RespFrame::Null, len)),
    }
}

fn parse_bulk_error(src: &[u8]) -> Result<(RespFrame, usize), KvNodeError> {
    match parse_length_prefixed_body(src, MAX_BULK_STRING_SIZE)? {
        (Some(data), len) => Ok((RespFrame::BulkError(data), len)),
        (None, len) => Ok((RespFrame::Null, len)),
    }
}

/// Parses an Array (e.g. `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`); `*-1\r\n` is `NullArray`.
/// Also used by `parse_push`, which differs only in the leading byte and the
/// wrapping variant.
fn parse_array_elements(
    src: &[u8],
    protocol_version: u8,
) -> Result<(Option<Vec<RespFrame>>, usize), KvNodeError> {
    let (line, len_of_line) = parse_line(&src[1..])?;
    let s = String::from_utf8_lossy(line);
    let arr_len = s
        .parse::<isize>()
        .map_err(|_| KvNodeError::Protocol("invalid array length".to_string()))?;

    if arr_len == -1 {
        return Ok((None, len_of_line + 1));
    }
    let arr_len = arr_len as usize;
    if arr_len > MAX_FRAME_ELEMENTS {
        return Err(KvNodeError::Protocol("array length exceeds limit".to_string()));
    }

    let mut frames = Vec::with_capacity(arr_len);
    let mut cursor = len_of_line + 1;
    for _ in 0..arr_len {
        let (frame, frame_len) = parse_frame(&src[cursor..], protocol_version)?;
        frames.push(frame);
        cursor += frame_len;
    }
    Ok((Some(frames), cursor))
}

fn parse_array(src: &[u8], protocol_version: u8) -> Result<(RespFrame, usize), KvNodeError> {
    match parse_array_elements(src, protocol_version)? {
        (Some(frames), len) => Ok((RespFrame::Array(frames), len)),
        (None, len) => Ok((RespFrame::NullArray, len)),
    }
}

fn parse_push(src: &[u8], protocol_version: u8) -> Result<(RespFrame, usize), KvNodeError> {
    match parse_array_elements(src, protocol_version)? {
        (Some(frames), len) => Ok((RespFrame::Push(frames), len)),
        (None, len) => Ok((RespFrame::Push(Vec::new()), len)),
    }
}

// --- RESP3 parsing functions, recognized but never acted upon by the dispatcher ---

fn parse_map(src: &[u8], protocol_version: u8) -> Result<(RespFrame, usize), KvNodeError> {
    let (line, len_of_line) = parse_line(&src[1..])?;
    let s = String::from_utf8_lossy(line);
    let map_len = s
        .parse::<isize>()
        .map_err(|_| KvNodeError::Protocol("invalid map length".to_string()))?;
    if map_len < 0 {
        return Err(KvNodeError::Protocol("negative map length".to_string()));
    }
    let map_len = map_len as usize;
    if map_len > MAX_FRAME_ELEMENTS {
        return Err(KvNodeError::Protocol("map length exceeds limit".to_string()));
    }

    let mut entries = Vec::with_capacity(map_len);
    let mut cursor = len_of_line + 1;
    for _ in 0..map_len {
        let (k, klen) = parse_frame(&src[cursor..], protocol_version)?;
        cursor += klen;
        let (v, vlen) = parse_frame(&src[cursor..], protocol_version)?;
        cursor += vlen;
        entries.push((k, v));
    }
    Ok((RespFrame::Map(entries), cursor))
}

fn parse_set(src: &[u8], protocol_version: u8) -> Result<(RespFrame, usize), KvNodeError> {
    let (line, len_of_line) = parse_line(&src[1..])?;
    let s = String::from_utf8_lossy(line);
    let set_len = s
        .parse::<isize>()
        .map_err(|_| KvNodeError::Protocol("invalid set length".to_string()))?;
    if set_len < 0 {
        return Err(KvNodeError::Protocol("negative set length".to_string()));
    }
    let set_len = set_len as usize;
    if set_len > MAX_FRAME_ELEMENTS {
        return Err(KvNodeError::Protocol("set length exceeds limit".to_string()));
    }

    let mut elements = Vec::with_capacity(set_len);
    let mut cursor = len_of_line + 1;
    for _ in 0..set_len {
        let (frame, flen) = parse_frame(&src[cursor..], protocol_version)?;
        elements.push(frame);
        cursor += flen;
    }
    Ok((RespFrame::Set(elements), cursor))
}

fn parse_boolean(src: &[u8]) -> Result<(RespFrame, usize), KvNodeError> {
    let (line, len) = parse_line(&src[1..])?;
    match line {
        b"t" => Ok((RespFrame::Boolean(true), len + 1)),
        b"f" => Ok((RespFrame::Boolean(false), len + 1)),
        _ => Err(KvNodeError::Protocol("invalid boolean frame".to_string())),
    }
}

fn parse_double(src: &[u8]) -> Result<(RespFrame, usize), KvNodeError> {
    let (line, len) = parse_line(&src[1..])?;
    let s = String::from_utf8_lossy(line);
    let d = s
        .parse::<f64>()
        .map_err(|_| KvNodeError::Protocol("invalid double frame".to_string()))?;
    Ok((RespFrame::Double(d), len + 1))
}

fn parse_big_number(src: &[u8]) -> Result<(RespFrame, usize), KvNodeError> {
    let (line, len) = parse_line(&src[1..])?;
    let s = String::from_utf8_lossy(line).to_string();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '+') {
        return Err(KvNodeError::Protocol("invalid big number frame".to_string()));
    }
    Ok((RespFrame::BigNumber(s), len + 1))
}

fn parse_verbatim_string(src: &[u8]) -> Result<(RespFrame, usize), KvNodeError> {
    let (line, len_of_line) = parse_line(&src[1..])?;
    let s = String::from_utf8_lossy(line);
    let str_len = s
        .parse::<isize>()
        .map_err(|_| KvNodeError::Protocol("invalid verbatim string length".to_string()))?;
    if str_len < 0 {
        return Err(KvNodeError::Protocol("negative verbatim string length".to_string()));
    }
    let str_len = str_len as usize;
    if str_len > MAX_BULK_STRING_SIZE {
        return Err(KvNodeError::Protocol("verbatim string exceeds limit".to_string()));
    }

    let prefix_len = len_of_line + 1;
    if src.len() < prefix_len + str_len + CRLF_LEN {
        return Err(KvNodeError::IncompleteFrame);
    }
    if &src[prefix_len + str_len..prefix_len + str_len + CRLF_LEN] != CRLF {
        return Err(KvNodeError::Protocol(
            "verbatim string missing trailing CRLF".to_string(),
        ));
    }

    let body = &src[prefix_len..prefix_len + str_len];
    let colon = body
        .iter()
        .position(|&b| b == b':')
        .ok_or_else(|| KvNodeError::Protocol("verbatim string missing format tag".to_string()))?;
    let format = String::from_utf8_lossy(&body[..colon]).to_string();
    let text = Bytes::copy_from_slice(&body[colon + 1..]);
    Ok((
        RespFrame::VerbatimString(format, text),
        prefix_len + str_len + CRLF_LEN,
    ))
}

fn parse_attribute(src: &[u8], protocol_version: u8) -> Result<(RespFrame, usize), KvNodeError> {
    let (line, len_of_line) = parse_line(&src[1..])?;
    let s = String::from_utf8_lossy(line);
    let attr_len = s
        .parse::<isize>()
        .map_err(|_| KvNodeError::Protocol("invalid attribute length".to_string()))?;
    if attr_len < 0 {
        return Err(KvNodeError::Protocol("negative attribute length".to_string()));
    }
    let attr_len = attr_len as usize;
    if attr_len > MAX_FRAME_ELEMENTS {
        return Err(KvNodeError::Protocol("attribute length exceeds limit".to_string()));
    }

    let mut attrs = Vec::with_capacity(attr_len);
    let mut cursor = len_of_line + 1;
    for _ in 0..attr_len {
        let (k, klen) = parse_frame(&src[cursor..], protocol_version)?;
        cursor += klen;
        let (v, vlen) = parse_frame(&src[cursor..], protocol_version)?;
        cursor += vlen;
        attrs.push((k, v));
    }
    let (data, dlen) = parse_frame(&src[cursor..], protocol_version)?;
    cursor += dlen;
    Ok((RespFrame::Attribute(attrs, Box::new(data)), cursor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_one(bytes: &[u8]) -> (RespFrame, Bytes) {
        let mut buf = BytesMut::from(bytes);
        RespFrameCodec::default()
            .decode(&mut buf)
            .expect("decode should not error")
            .expect("a full frame should be available")
    }

    #[test]
    fn decodes_simple_string() {
        let (frame, raw) = decode_one(b"+PONG\r\n");
        assert_eq!(frame, RespFrame::SimpleString("PONG".to_string()));
        assert_eq!(&raw[..], b"+PONG\r\n");
    }

    #[test]
    fn decodes_bulk_string_array() {
        let (frame, raw) = decode_one(b"*2\r\n$4\r\nECHO\r\n$5\r\nhello\r\n");
        assert_eq!(
            frame,
            RespFrame::Array(vec![
                RespFrame::BulkString(Bytes::from_static(b"ECHO")),
                RespFrame::BulkString(Bytes::from_static(b"hello")),
            ])
        );
        assert_eq!(&raw[..], b"*2\r\n$4\r\nECHO\r\n$5\r\nhello\r\n");
    }

    #[test]
    fn null_bulk_string_round_trips() {
        let mut buf = BytesMut::new();
        RespFrameCodec::default()
            .encode(RespFrame::Null, &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"$-1\r\n");
        let (frame, _) = decode_one(&buf);
        assert_eq!(frame, RespFrame::Null);
    }

    #[test]
    fn incomplete_frame_yields_none() {
        let mut buf = BytesMut::from(&b"*2\r\n$4\r\nECHO\r\n$5\r\nhel"[..]);
        let result = RespFrameCodec::default().decode(&mut buf).unwrap();
        assert!(result.is_none());
        // The buffer must be untouched so more bytes can be appended on the next read.
        assert_eq!(&buf[..], b"*2\r\n$4\r\nECHO\r\n$5\r\nhel");
    }

    #[test]
    fn recognizes_resp3_tags_without_advancing_dispatch() {
        let (frame, _) = decode_one(b"#t\r\n");
        assert_eq!(frame, RespFrame::Boolean(true));
        let (frame, _) = decode_one(b",3.14\r\n");
        assert_eq!(frame, RespFrame::Double(3.14));
    }

    #[test]
    fn unknown_prefix_is_a_protocol_error() {
        let mut buf = BytesMut::from(&b"@nope\r\n"[..]);
        let err = RespFrameCodec::default().decode(&mut buf).unwrap_err();
        assert!(matches!(err, KvNodeError::Protocol(_)));
    }

    #[test]
    fn parse_error_drops_the_bad_frame_so_the_next_frame_can_be_decoded() {
        let mut buf = BytesMut::from(&b"@nope\r\n+PONG\r\n"[..]);
        let mut codec = RespFrameCodec::default();

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, KvNodeError::Protocol(_)));
        // The malformed line must be gone, not just re-parsed next call.
        assert_eq!(&buf[..], b"+PONG\r\n");

        let (frame, _) = codec
            .decode(&mut buf)
            .unwrap()
            .expect("the next, well-formed frame should decode");
        assert_eq!(frame, RespFrame::SimpleString("PONG".to_string()));
    }

    #[test]
    fn encode_array_matches_spec_scenario() {
        let mut buf = BytesMut::new();
        RespFrameCodec::default()
            .encode(
                RespFrame::Array(vec![
                    RespFrame::BulkString(Bytes::from_static(b"SET")),
                    RespFrame::BulkString(Bytes::from_static(b"foo")),
                    RespFrame::BulkString(Bytes::from_static(b"bar")),
                ]),
                &mut buf,
            )
            .unwrap();
        assert_eq!(&buf[..], b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n");
    }
}
