//! HTTP egress server for RAOP audio streams.
//!
//! AirTunes speakers that re-broadcast over HTTP (e.g. for a second-stage
//! decoder, or `Shairport`-style ICY metadata consumers) expose the live
//! audio as a plain HTTP GET/HEAD resource: `Range` requests replay from a
//! short ring cache, `Icy-MetaData: 1` opts a client into interleaved
//! ICY metadata frames, and a response with unknown length is sent
//! chunked. This module is a sans-IO request codec plus a small ring
//! cache and chunk/ICY framer; the bytes it produces still need a
//! `TcpStream` to write to.

use std::collections::HashMap;

/// Size of the ring cache used to answer `Range` requests against
/// recently-sent audio.
pub const CACHE_RING_SIZE: usize = 2 * 1024 * 1024;
/// Sentinel content length meaning "unknown, send chunked" (mirrors the
/// `-3` length convention used on the wire for open-ended streams).
pub const CHUNKED_LENGTH: i64 = -3;

/// HTTP method accepted by the egress endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EgressMethod {
    Get,
    Head,
}

/// A fully parsed request line plus headers.
#[derive(Debug, Clone)]
pub struct EgressRequest {
    pub method: EgressMethod,
    pub path: String,
    pub headers: HashMap<String, String>,
}

impl EgressRequest {
    /// Parsed `Range: bytes=start-end` header, if present and well formed.
    #[must_use]
    pub fn range(&self) -> Option<ByteRange> {
        let raw = self.headers.get("range")?;
        ByteRange::parse(raw)
    }

    /// Whether the client opted into ICY metadata interleaving.
    #[must_use]
    pub fn wants_icy_metadata(&self) -> bool {
        self.headers
            .get("icy-metadata")
            .is_some_and(|v| v.trim() == "1")
    }
}

/// A parsed `Range: bytes=start-end` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    /// Inclusive end, if the client specified one.
    pub end: Option<u64>,
}

impl ByteRange {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let spec = raw.strip_prefix("bytes=")?;
        let (start, end) = spec.split_once('-')?;
        let start: u64 = start.trim().parse().ok()?;
        let end = if end.trim().is_empty() {
            None
        } else {
            Some(end.trim().parse().ok()?)
        };
        Some(Self { start, end })
    }
}

/// Errors from [`EgressCodec::decode`].
#[derive(Debug, thiserror::Error)]
pub enum EgressCodecError {
    #[error("malformed request line: {0}")]
    InvalidRequestLine(String),
    #[error("malformed header: {0}")]
    InvalidHeader(String),
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("request exceeds {max} bytes")]
    TooLarge { max: usize },
}

/// Incremental parser for HTTP request heads (GET/HEAD have no body).
pub struct EgressCodec {
    buffer: Vec<u8>,
    max_size: usize,
}

impl EgressCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(1024),
            max_size: 8192,
        }
    }

    /// # Errors
    /// Returns [`EgressCodecError::TooLarge`] if buffering `bytes` would
    /// exceed the codec's size limit.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), EgressCodecError> {
        if self.buffer.len() + bytes.len() > self.max_size {
            return Err(EgressCodecError::TooLarge { max: self.max_size });
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Try to decode one complete request head.
    ///
    /// # Errors
    /// Returns an error if the buffered data isn't a well-formed request.
    pub fn decode(&mut self) -> Result<Option<EgressRequest>, EgressCodecError> {
        let Some(header_end) = self.buffer.windows(4).position(|w| w == b"\r\n\r\n") else {
            return Ok(None);
        };

        let head = String::from_utf8_lossy(&self.buffer[..header_end]).to_string();
        let mut lines = head.split("\r\n");

        let request_line = lines
            .next()
            .ok_or_else(|| EgressCodecError::InvalidRequestLine(head.clone()))?;
        let mut parts = request_line.split(' ');
        let method_str = parts
            .next()
            .ok_or_else(|| EgressCodecError::InvalidRequestLine(request_line.to_string()))?;
        let path = parts
            .next()
            .ok_or_else(|| EgressCodecError::InvalidRequestLine(request_line.to_string()))?
            .to_string();

        let method = match method_str {
            "GET" => EgressMethod::Get,
            "HEAD" => EgressMethod::Head,
            other => return Err(EgressCodecError::UnsupportedMethod(other.to_string())),
        };

        let mut headers = HashMap::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| EgressCodecError::InvalidHeader(line.to_string()))?;
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        self.buffer.drain(..header_end + 4);

        Ok(Some(EgressRequest {
            method,
            path,
            headers,
        }))
    }

    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for EgressCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the response head for a live, open-ended audio stream.
#[must_use]
pub fn chunked_response_head(content_type: &str, icy_metaint: Option<usize>) -> Vec<u8> {
    let mut head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n"
    );
    if let Some(interval) = icy_metaint {
        head.push_str("icy-name: AirTunes\r\n");
        head.push_str(&format!("icy-metaint: {interval}\r\n"));
    }
    head.push_str("\r\n");
    head.into_bytes()
}

/// Build the response head for a `Range` re-serve out of the cache, with
/// a known total length.
#[must_use]
pub fn range_response_head(content_type: &str, range: ByteRange, served_end: u64, total_len: u64) -> Vec<u8> {
    format!(
        "HTTP/1.1 206 Partial Content\r\nContent-Type: {content_type}\r\nContent-Range: bytes {}-{}/{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        range.start,
        served_end,
        total_len,
        served_end - range.start + 1
    )
    .into_bytes()
}

/// Frame `data` as one HTTP chunk (`Transfer-Encoding: chunked`).
#[must_use]
pub fn encode_chunk(data: &[u8]) -> Vec<u8> {
    let mut out = format!("{:x}\r\n", data.len()).into_bytes();
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
    out
}

/// The terminating zero-length chunk.
#[must_use]
pub fn final_chunk() -> &'static [u8] {
    b"0\r\n\r\n"
}

/// Interleaves ICY metadata frames into an outgoing audio byte stream
/// every `interval` bytes, per the Shoutcast/Icecast convention: a
/// single length byte (`block_len / 16`, rounded up) followed by the
/// metadata block padded with NULs to a multiple of 16 bytes.
pub struct IcyInterleaver {
    interval: usize,
    bytes_since_marker: usize,
    metadata: Vec<u8>,
}

impl IcyInterleaver {
    #[must_use]
    pub fn new(interval: usize) -> Self {
        Self {
            interval,
            bytes_since_marker: 0,
            metadata: Vec::new(),
        }
    }

    /// Replace the metadata string injected at the next marker boundary
    /// (e.g. `StreamTitle='Artist - Track';`).
    pub fn set_metadata(&mut self, metadata_string: &str) {
        self.metadata = metadata_string.as_bytes().to_vec();
    }

    /// Split `audio` into interleaved chunks, inserting an ICY metadata
    /// frame every `interval` bytes of audio payload.
    pub fn interleave(&mut self, audio: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(audio.len() + 32);
        let mut remaining = audio;

        while !remaining.is_empty() {
            let room = self.interval - self.bytes_since_marker;
            let take = room.min(remaining.len());
            out.extend_from_slice(&remaining[..take]);
            self.bytes_since_marker += take;
            remaining = &remaining[take..];

            if self.bytes_since_marker == self.interval {
                out.extend_from_slice(&self.marker_frame());
                self.bytes_since_marker = 0;
            }
        }
        out
    }

    fn marker_frame(&self) -> Vec<u8> {
        if self.metadata.is_empty() {
            return vec![0u8];
        }
        let padded_len = self.metadata.len().div_ceil(16) * 16;
        let mut frame = Vec::with_capacity(padded_len + 1);
        #[allow(clippy::cast_possible_truncation, reason = "metadata blocks are capped well under 4080 bytes")]
        frame.push((padded_len / 16) as u8);
        frame.extend_from_slice(&self.metadata);
        frame.resize(1 + padded_len, 0);
        frame
    }
}

/// Fixed-capacity ring recording recently-sent audio bytes, so a `Range`
/// request for something still within the window can be re-served
/// without re-decoding.
pub struct CacheRing {
    buffer: Box<[u8]>,
    /// Absolute stream offset of the next byte to be written.
    write_offset: u64,
}

impl CacheRing {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: vec![0u8; CACHE_RING_SIZE].into_boxed_slice(),
            write_offset: 0,
        }
    }

    /// Append bytes to the ring, overwriting the oldest data once full.
    pub fn push(&mut self, data: &[u8]) {
        let len = self.buffer.len();
        for &byte in data {
            #[allow(clippy::cast_possible_truncation, reason = "len is bounded by CACHE_RING_SIZE")]
            let idx = (self.write_offset % len as u64) as usize;
            self.buffer[idx] = byte;
            self.write_offset += 1;
        }
    }

    /// Absolute offset of the next byte that will be written.
    #[must_use]
    pub fn write_offset(&self) -> u64 {
        self.write_offset
    }

    /// Read the absolute byte range `[start, end]` inclusive, or `None`
    /// if any part of it has already fallen out of the ring's window.
    #[must_use]
    pub fn read_range(&self, start: u64, end: u64) -> Option<Vec<u8>> {
        if end < start || end >= self.write_offset {
            return None;
        }
        let len = self.buffer.len() as u64;
        if self.write_offset - start > len {
            return None;
        }

        let mut out = Vec::with_capacity((end - start + 1) as usize);
        let mut offset = start;
        while offset <= end {
            #[allow(clippy::cast_possible_truncation, reason = "buffer length is bounded by CACHE_RING_SIZE")]
            let idx = (offset % len) as usize;
            out.push(self.buffer[idx]);
            offset += 1;
        }
        Some(out)
    }
}

impl Default for CacheRing {
    fn default() -> Self {
        Self::new()
    }
}

/// Produces silence frames for startup padding and pause gaps, matching
/// the negotiated sample format.
#[derive(Debug, Clone, Copy)]
pub struct SilenceGenerator {
    bytes_per_frame: usize,
}

impl SilenceGenerator {
    #[must_use]
    pub fn new(channels: u16, bits_per_sample: u16) -> Self {
        Self {
            bytes_per_frame: usize::from(channels) * usize::from(bits_per_sample / 8),
        }
    }

    /// `frame_count` frames of silence, ready to hand to [`IcyInterleaver::interleave`]
    /// or write directly to the chunk encoder.
    #[must_use]
    pub fn frames(&self, frame_count: usize) -> Vec<u8> {
        vec![0u8; self.bytes_per_frame * frame_count]
    }
}
