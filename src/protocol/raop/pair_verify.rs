//! `AirPlay`-1 pair-verify: the fast-reconnect handshake a sender performs
//! with an AppleTV it has already completed PIN pairing with.
//!
//! Unlike `HomeKit`'s four-message, TLV8/ChaCha20-Poly1305 pair-verify (see
//! [`crate::protocol::pairing::verify`], kept for the `AirPlay`-2 control
//! plane), `AirPlay`-1 uses a plain two-POST exchange over raw binary
//! bodies and AES-128-CTR.

use crate::protocol::crypto::{Aes128Ctr, CryptoError, Ed25519KeyPair, X25519KeyPair, X25519PublicKey};
use sha2::{Digest, Sha512};

/// Errors raised while driving the pair-verify state machine.
#[derive(Debug, thiserror::Error)]
pub enum PairVerifyError {
    /// The device's first response was shorter than `atv_pub || atv_data`.
    #[error("pair-verify response too short: needed at least {needed}, got {got}")]
    ResponseTooShort {
        /// Minimum expected length.
        needed: usize,
        /// Actual length received.
        got: usize,
    },
    /// A step was invoked out of order.
    #[error("pair-verify called out of sequence")]
    InvalidState,
    /// Underlying crypto primitive failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Derives the two AES-128-CTR key material fields shared by pair-verify
/// and, with different labels, PIN pairing: `SHA512(label || shared)[0..16]`.
fn derive_aes_field(label: &str, shared: &[u8]) -> [u8; 16] {
    let mut hasher = Sha512::new();
    hasher.update(label.as_bytes());
    hasher.update(shared);
    let digest = hasher.finalize();
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);
    out
}

/// Drives the two-POST `AirPlay`-1 pair-verify handshake for a previously
/// PIN-paired AppleTV.
pub struct RaopPairVerify {
    auth_keypair: Ed25519KeyPair,
    verify_keypair: X25519KeyPair,
    verify_pub: [u8; 32],
    aes_key: Option<[u8; 16]>,
    aes_iv: Option<[u8; 16]>,
}

impl RaopPairVerify {
    /// Start a new pair-verify session from a stored long-term Ed25519
    /// secret (the credential persisted after PIN pairing).
    #[must_use]
    pub fn new(auth_secret: [u8; 32]) -> Self {
        let auth_keypair =
            Ed25519KeyPair::from_bytes(&auth_secret).expect("32-byte secret is always valid");
        let verify_keypair = X25519KeyPair::generate();
        let verify_pub = *verify_keypair.public_key().as_bytes();

        Self {
            auth_keypair,
            verify_keypair,
            verify_pub,
            aes_key: None,
            aes_iv: None,
        }
    }

    /// Build the first POST body: `01 00 00 00 || verify_pub || auth_pub`.
    #[must_use]
    pub fn start(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(4 + 32 + 32);
        body.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]);
        body.extend_from_slice(&self.verify_pub);
        body.extend_from_slice(self.auth_keypair.public_key().as_bytes());
        body
    }

    /// Process the device's `atv_pub || atv_data` response and build the
    /// second POST body: `00 00 00 00 || ctr(signed)`.
    ///
    /// # Errors
    /// Returns [`PairVerifyError`] if the response is truncated or key
    /// derivation fails.
    pub fn process_response(&mut self, response: &[u8]) -> Result<Vec<u8>, PairVerifyError> {
        if response.len() < 32 {
            return Err(PairVerifyError::ResponseTooShort {
                needed: 32,
                got: response.len(),
            });
        }

        let atv_pub_bytes: [u8; 32] = response[..32].try_into().expect("checked length above");
        let atv_data = &response[32..];

        let atv_pub = X25519PublicKey::from_bytes(&atv_pub_bytes)?;
        let shared = self.verify_keypair.diffie_hellman(&atv_pub);

        let aes_key = derive_aes_field("Pair-Verify-AES-Key", shared.as_bytes());
        let aes_iv = derive_aes_field("Pair-Verify-AES-IV", shared.as_bytes());

        let mut sign_data = Vec::with_capacity(64);
        sign_data.extend_from_slice(&self.verify_pub);
        sign_data.extend_from_slice(&atv_pub_bytes);
        let signature = self.auth_keypair.sign(&sign_data);

        // The stream cipher runs continuously across atv_data (discarded,
        // since this flow never verifies the device's proof, matching the
        // permissive client AirPlay-1 senders have always shipped) and the
        // signed blob we send back.
        let mut cipher = Aes128Ctr::new(&aes_key, &aes_iv)?;
        let mut scratch = vec![0u8; atv_data.len()];
        cipher.apply_keystream(&mut scratch);

        let mut signed = signature.to_bytes().to_vec();
        cipher.apply_keystream(&mut signed);

        self.aes_key = Some(aes_key);
        self.aes_iv = Some(aes_iv);

        let mut body = Vec::with_capacity(4 + signed.len());
        body.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        body.extend_from_slice(&signed);
        Ok(body)
    }
}
