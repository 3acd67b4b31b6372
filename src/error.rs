//! Error types shared across the crate.
//!
//! Every variant maps onto one of `spec.md` §7's error-kind categories:
//! transient-network (`Timeout`, `DeviceBusy`, `NetworkError`, `IoError`),
//! protocol-fatal (`RtspError`, `CodecError`, `RtpError`, `ConnectionFailed`,
//! `ConnectionTimeout`, `Disconnected`), auth-required
//! (`AuthenticationFailed`), out-of-protocol (`InvalidParameter`,
//! `InvalidState`, `NotImplemented`), and discovery-specific failures
//! (`DeviceNotFound`, `DiscoveryFailed`).

use std::io;
use std::time::Duration;

/// Main error type for `AirPlay` operations.
#[derive(Debug, thiserror::Error)]
pub enum AirPlayError {
    /// The connection to a device was lost.
    #[error("connection to {device_name} lost")]
    Disconnected {
        /// Name of the device that disconnected.
        device_name: String,
    },

    /// Establishing a connection to a device failed.
    #[error("connection to {device_name} failed: {message}")]
    ConnectionFailed {
        /// Name of the device.
        device_name: String,
        /// Human-readable failure reason.
        message: String,
        /// Underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connecting did not complete within the configured timeout.
    #[error("connection timed out after {duration:?}")]
    ConnectionTimeout {
        /// How long the client waited before giving up.
        duration: Duration,
    },

    /// A generic operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// The device is currently busy with another session.
    #[error("device is busy")]
    DeviceBusy,

    /// No device matching the request could be found.
    #[error("device not found: {device_id}")]
    DeviceNotFound {
        /// Identifier that was looked up.
        device_id: String,
    },

    /// mDNS/Bonjour discovery failed outright.
    #[error("discovery failed: {message}")]
    DiscoveryFailed {
        /// Human-readable failure reason.
        message: String,
        /// Underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Pairing or authentication with the device failed.
    #[error("authentication failed: {message}")]
    AuthenticationFailed {
        /// Human-readable failure reason.
        message: String,
        /// Whether the caller may retry (e.g. wrong PIN) or not (protocol
        /// mismatch).
        recoverable: bool,
    },

    /// An RTSP request failed or the response could not be parsed.
    #[error("RTSP error: {message}")]
    RtspError {
        /// Human-readable failure reason.
        message: String,
        /// RTSP status code, if the failure came from a response.
        status_code: Option<u16>,
    },

    /// Encoding or decoding audio failed.
    #[error("codec error: {message}")]
    CodecError {
        /// Human-readable failure reason.
        message: String,
    },

    /// Building or parsing an RTP packet failed.
    #[error("RTP error: {message}")]
    RtpError {
        /// Human-readable failure reason.
        message: String,
    },

    /// The operation is not valid in the client's current state.
    #[error("invalid state ({current_state}): {message}")]
    InvalidState {
        /// Human-readable failure reason.
        message: String,
        /// Name of the state the client was in.
        current_state: String,
    },

    /// A caller-supplied parameter was invalid.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Name of the invalid parameter.
        name: String,
        /// Human-readable failure reason.
        message: String,
    },

    /// The requested feature is not implemented.
    #[error("not implemented: {feature}")]
    NotImplemented {
        /// Name of the unimplemented feature.
        feature: String,
    },

    /// An I/O operation failed outside the raw network read/write path.
    #[error("I/O error: {message}")]
    IoError {
        /// Human-readable failure reason.
        message: String,
        /// Underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A raw network error, typically converted via `From<io::Error>`.
    #[error("network error: {0}")]
    NetworkError(#[source] io::Error),
}

impl AirPlayError {
    /// Whether the caller can reasonably retry the operation that produced
    /// this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout | Self::DeviceBusy | Self::ConnectionTimeout { .. } => true,
            Self::AuthenticationFailed { recoverable, .. } => *recoverable,
            Self::NetworkError(_) | Self::IoError { .. } => true,
            _ => false,
        }
    }

    /// Whether this error represents a lost connection (as opposed to a
    /// request that simply failed while the connection itself is fine).
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Disconnected { .. } | Self::ConnectionFailed { .. })
    }
}

impl From<io::Error> for AirPlayError {
    fn from(err: io::Error) -> Self {
        Self::NetworkError(err)
    }
}
