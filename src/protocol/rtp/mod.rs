//! RTP/RAOP protocol implementation for AirPlay audio streaming

#![allow(clippy::all)]
#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![allow(missing_docs)]

mod codec;
mod control;
mod packet;
pub mod packet_buffer;
pub mod raop;
pub mod raop_timing;
mod timing;

#[cfg(test)]
#[path = "tests/control.rs"]
mod control_tests;
#[cfg(test)]
#[path = "tests/extra_packet.rs"]
mod extra_packet_tests;
#[cfg(test)]
#[path = "tests/packet_buffer.rs"]
mod packet_buffer_tests;
#[cfg(test)]
#[path = "tests/packet_buffer_extra.rs"]
mod packet_buffer_extra_tests;
#[cfg(test)]
#[path = "tests/packet_extra.rs"]
mod packet_extra_tests;
#[cfg(test)]
mod packet_tests;
#[cfg(test)]
#[path = "tests/packet_proptest.rs"]
mod packet_proptest;
#[cfg(test)]
#[path = "tests/raop.rs"]
mod raop_tests;
#[cfg(test)]
#[path = "tests/raop_timing.rs"]
mod raop_timing_tests;
#[cfg(test)]
#[path = "tests/timing.rs"]
mod timing_tests;
#[cfg(test)]
mod wrapping_tests;

pub use codec::{AudioPacketBuilder, RtpCodec, RtpCodecError, RtpEncryptionMode};
pub use control::{ControlPacket, RetransmitRequest};
pub use packet::{PayloadType, RtpDecodeError, RtpHeader, RtpPacket};
pub use timing::{NtpTimestamp, TimingPacket, TimingRequest, TimingResponse, ntp_to_ts, ts_to_ntp};

/// RTP protocol constants for AirPlay
pub mod constants {
    /// Default RTP audio port
    pub const AUDIO_PORT: u16 = 6000;
    /// Default RTP control port
    pub const CONTROL_PORT: u16 = 6001;
    /// Default RTP timing port
    pub const TIMING_PORT: u16 = 6002;

    /// Audio frames per RTP packet (352 samples at 44.1kHz ≈ 8ms)
    pub const FRAMES_PER_PACKET: usize = 352;

    /// Audio sample rate
    pub const SAMPLE_RATE: u32 = 44100;

    /// Audio channels (stereo)
    pub const CHANNELS: u8 = 2;

    /// Bits per sample
    pub const BITS_PER_SAMPLE: u8 = 16;
}
