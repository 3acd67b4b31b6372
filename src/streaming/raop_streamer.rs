//! RAOP audio streaming coordinator: the sender-side pacing, backlog and
//! sync/timing cadence that turns encoded audio frames into framed,
//! encrypted RTP packets.

use crate::protocol::raop::encryption::RaopEncryptor;
use crate::protocol::raop::{RaopSessionKeys, SenderBacklog};
use crate::protocol::rtp::raop::{RaopAudioPacket, SyncPacket};
use crate::protocol::rtp::raop_timing::TimingSync;
use bytes::Bytes;
use std::time::{Duration, Instant};

/// RAOP streaming configuration
#[derive(Debug, Clone)]
pub struct RaopStreamConfig {
    /// Sample rate (Hz)
    pub sample_rate: u32,
    /// Samples per packet (352 for ALAC)
    pub samples_per_packet: u32,
    /// SSRC for RTP packets
    pub ssrc: u32,
    /// Enable retransmission buffer
    pub enable_retransmit: bool,
}

impl Default for RaopStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            samples_per_packet: 352,
            ssrc: rand::random(),
            enable_retransmit: true,
        }
    }
}

/// Sender-side playback state, mirroring the `AirPlay`-1 `FLUSHED
/// <-> STREAMING <-> FLUSHING` machine: frames are only accepted while
/// `Streaming`, `begin_flush` moves to `Flushing` until the peer
/// acknowledges (`finish_flush`). Pause has no dedicated wire state; a
/// paused sender simply stops calling `encode_frame` while remaining
/// `Streaming`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    /// No RECORD sent yet, or torn down.
    Flushed,
    /// RECORD acknowledged, frames are being accepted and sent.
    Streaming,
    /// FLUSH sent, waiting for the flush to be acknowledged.
    Flushing,
}

/// RAOP audio streamer
pub struct RaopStreamer {
    /// Configuration
    config: RaopStreamConfig,
    /// Current sequence number
    sequence: u16,
    /// Current RTP timestamp
    timestamp: u32,
    /// RTP timestamp of the first packet sent since the last flush/start,
    /// used to report `RTP-Info` on RECORD/FLUSH.
    first_ts: u32,
    /// Encryptor bound to the session's AES key/IV.
    encryptor: RaopEncryptor,
    /// Session encryption keys (kept for SDP / re-use).
    keys: RaopSessionKeys,
    /// Fixed-size retransmit backlog.
    backlog: SenderBacklog,
    /// Timing synchronization
    timing: TimingSync,
    /// Is first packet after start/flush
    is_first_packet: bool,
    /// Last sync packet sent
    last_sync: Instant,
    /// Last timing request sent
    last_timing: Instant,
    /// Current playback state.
    state: SenderState,
}

impl RaopStreamer {
    /// Timing request interval
    const TIMING_INTERVAL: Duration = Duration::from_secs(3);

    /// Sync packet interval
    const SYNC_INTERVAL: Duration = Duration::from_millis(1000);

    /// Create new streamer
    #[must_use]
    pub fn new(keys: RaopSessionKeys, config: RaopStreamConfig) -> Self {
        let encryptor = RaopEncryptor::new(*keys.aes_key(), *keys.aes_iv());

        Self {
            config,
            sequence: 0,
            timestamp: 0,
            first_ts: 0,
            encryptor,
            keys,
            backlog: SenderBacklog::new(),
            timing: TimingSync::new(),
            is_first_packet: true,
            last_sync: Instant::now(),
            last_timing: Instant::now(),
            state: SenderState::Flushed,
        }
    }

    /// Get current sequence number
    #[must_use]
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Get current timestamp
    #[must_use]
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// Session keys this streamer was constructed with.
    #[must_use]
    pub fn keys(&self) -> &RaopSessionKeys {
        &self.keys
    }

    /// Current playback state.
    #[must_use]
    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Move from `Flushed` to `Streaming` after RECORD is acknowledged.
    pub fn start_streaming(&mut self) {
        self.state = SenderState::Streaming;
        self.is_first_packet = true;
    }

    /// Request a flush: frames are rejected until `finish_flush` is called.
    /// No-op unless currently streaming, matching the real protocol where
    /// FLUSH is only meaningful mid-stream.
    pub fn begin_flush(&mut self) {
        if self.state == SenderState::Streaming {
            self.state = SenderState::Flushing;
        }
    }

    /// Complete a flush once the peer has acknowledged it: clears the
    /// backlog and returns to `Flushed`, ready for a fresh `start_streaming`.
    pub fn finish_flush(&mut self) {
        self.backlog.clear();
        self.state = SenderState::Flushed;
    }

    /// Whether a new audio frame may be encoded and sent right now.
    #[must_use]
    pub fn accepts_frames(&self) -> bool {
        self.state == SenderState::Streaming
    }

    /// Encode audio frame to RTP packet, encrypt its payload, and push a
    /// copy into the retransmit backlog.
    ///
    /// Audio should be encoded ALAC data (or raw PCM depending on codec).
    /// Returns `None` if the streamer is not currently accepting frames
    /// (flushed or mid-flush).
    pub fn encode_frame(&mut self, audio_data: &[u8]) -> Option<Bytes> {
        if !self.accepts_frames() {
            return None;
        }

        let mut payload = audio_data.to_vec();
        self.encryptor
            .encrypt_in_place(&mut payload, u64::from(self.sequence))
            .expect("encryption with a fixed 16-byte key/IV cannot fail");

        let mut packet =
            RaopAudioPacket::new(self.sequence, self.timestamp, self.config.ssrc, payload);
        if self.is_first_packet {
            packet = packet.with_marker();
            self.first_ts = self.timestamp;
            self.is_first_packet = false;
        }

        if self.config.enable_retransmit {
            self.backlog.push(packet.clone());
        }

        let encoded = packet.encode();

        self.sequence = self.sequence.wrapping_add(1);
        self.timestamp = self.timestamp.wrapping_add(self.config.samples_per_packet);

        Some(encoded)
    }

    /// RTP timestamp of the first packet sent since the last flush.
    #[must_use]
    pub fn first_timestamp(&self) -> u32 {
        self.first_ts
    }

    /// Handle retransmit request
    #[must_use]
    pub fn handle_retransmit(&self, seq_start: u16, count: u16) -> Vec<Vec<u8>> {
        self.backlog
            .get_range(seq_start, count)
            .into_iter()
            .map(|p| {
                // Wrap in retransmit response header
                let encoded = p.encode();
                let mut response = Vec::with_capacity(4 + encoded.len() - 4);
                response.push(0x80);
                response.push(0xD6); // PT=0x56 (retransmit response)
                response.extend_from_slice(&p.sequence.to_be_bytes());
                response.extend_from_slice(&encoded[4..]); // skip original RTP header's V/PT/seq
                response
            })
            .collect()
    }

    /// Check if sync packet should be sent
    #[must_use]
    pub fn should_send_sync(&self) -> bool {
        self.last_sync.elapsed() >= Self::SYNC_INTERVAL
    }

    /// Create sync packet
    pub fn create_sync_packet(&mut self) -> Vec<u8> {
        let ntp_time = crate::protocol::rtp::NtpTimestamp::now();
        let packet = SyncPacket::new(
            self.timestamp,
            ntp_time,
            self.timestamp.wrapping_add(self.config.samples_per_packet),
            false,
        );
        self.last_sync = Instant::now();
        packet.encode()
    }

    /// Check if timing request should be sent
    #[must_use]
    pub fn should_send_timing(&self) -> bool {
        self.last_timing.elapsed() >= Self::TIMING_INTERVAL
    }

    /// Create timing request
    pub fn create_timing_request(&mut self) -> Vec<u8> {
        self.last_timing = Instant::now();
        self.timing.create_request()
    }

    /// Process timing response
    ///
    /// # Errors
    ///
    /// Returns error string if response invalid (legacy reasons, should probably be Result<(), Error>)
    pub fn process_timing_response(&mut self, data: &[u8]) -> Result<(), String> {
        self.timing
            .process_response(data)
            .map_err(|e| e.to_string())
    }

    /// Flush and prepare for new playback. Equivalent to `begin_flush`
    /// immediately followed by `finish_flush`, for callers that don't need
    /// to observe the in-between `Flushing` state.
    pub fn flush(&mut self) {
        self.is_first_packet = true;
        self.backlog.clear();
        self.state = SenderState::Flushed;
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        self.sequence = 0;
        self.timestamp = 0;
        self.first_ts = 0;
        self.is_first_packet = true;
        self.backlog.clear();
        self.timing = TimingSync::new();
        self.state = SenderState::Flushed;
    }
}
