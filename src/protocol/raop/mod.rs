//! RAOP (`AirPlay` 1) protocol implementation

mod auth;
mod backlog;
pub mod encryption;
mod key_exchange;
pub mod pair_verify;
pub mod pin_pairing;
pub mod session;

#[cfg(test)]
mod tests;
#[cfg(test)]
#[path = "encryption_tests.rs"]
mod encryption_tests;
#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;

pub use auth::{
    AuthState, CHALLENGE_SIZE, RaopAuthenticator, build_response_message, decode_challenge,
    encode_challenge, generate_challenge, generate_response, verify_response,
};

pub use backlog::{BACKLOG_SIZE, SenderBacklog};
pub use encryption::{EncryptionConfig, EncryptionMode, RaopDecryptor, RaopEncryptor};
pub use key_exchange::{AES_IV_SIZE, AES_KEY_SIZE, RaopSessionKeys, parse_session_keys};
pub use pair_verify::RaopPairVerify;
pub use pin_pairing::{PinPairingError, RaopPinPairing};
pub use session::{RaopRtspSession, RaopSessionState, RaopTransport};
