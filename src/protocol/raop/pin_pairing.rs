//! `AirPlay`-1 SRP PIN pairing: the three-round-trip, binary-plist-over-POST
//! flow used the first time a sender enrols with an AppleTV.
//!
//! This establishes the long-term Ed25519 secret that
//! [`super::pair_verify::RaopPairVerify`] later uses for fast reconnects.
//! The wire format is unrelated to `HomeKit`'s TLV8 pair-setup (see
//! [`crate::protocol::pairing::setup`]) even though both ultimately run
//! SRP-6a: `AirPlay`-1 speaks RFC5054's 2048-bit group with SHA-1
//! throughout. Unlike the reference sender implementation (which receives
//! the device's M2 proof and discards it unchecked), this client verifies
//! it and fails the pairing on mismatch.

use crate::plist_dict;
use crate::protocol::crypto::{
    Aes128GcmLongNonce, CryptoError, Ed25519KeyPair, SrpClient, SrpParams, SrpVerifier,
};
use crate::protocol::plist::{PlistDecodeError, PlistValue, decode, encode};
use crate::protocol::rtsp::{Method, RtspRequest};
use sha2::{Digest, Sha512};

/// Errors raised while driving the PIN-pairing state machine.
#[derive(Debug, thiserror::Error)]
pub enum PinPairingError {
    /// The server's bplist response was malformed.
    #[error("invalid bplist response: {0}")]
    InvalidResponse(#[from] PlistDecodeError),
    /// A required field was missing from an otherwise well-formed bplist.
    #[error("response missing field {0}")]
    MissingField(&'static str),
    /// The device's M2 proof did not match our expectation.
    #[error("SRP proof mismatch: device failed to prove knowledge of the PIN")]
    ProofMismatch,
    /// Underlying crypto primitive failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

fn derive_aes_field(label: &str, k_session: &[u8]) -> [u8; 16] {
    let mut hasher = Sha512::new();
    hasher.update(label.as_bytes());
    hasher.update(k_session);
    let digest = hasher.finalize();
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);
    out
}

fn dict_bytes<'a>(dict: &'a PlistValue, key: &'static str) -> Result<&'a [u8], PinPairingError> {
    dict.as_dict()
        .and_then(|d| d.get(key))
        .and_then(PlistValue::as_bytes)
        .ok_or(PinPairingError::MissingField(key))
}

/// Drives the three-POST `AirPlay`-1 PIN pairing flow to completion.
///
/// Usage: [`Self::start_request`], then feed the server's PIN-start
/// acknowledgement (ignored) into nothing; [`Self::challenge_request`] needs
/// the device's username; then [`Self::process_challenge_response`] with the
/// server's `{pk, salt}` bplist to get the proof POST; then
/// [`Self::verify_proof_response`] with the server's M2 reply to confirm it
/// actually knows the PIN before trusting the session key; finally
/// [`Self::finish`] persists the new Ed25519 secret.
pub struct RaopPinPairing {
    username: Vec<u8>,
    pin: Vec<u8>,
    verifier: Option<SrpVerifier>,
    session_key: Option<Vec<u8>>,
}

impl RaopPinPairing {
    /// Begin a PIN-pairing session. `username` is the device's UDN
    /// (unique device name, as used elsewhere in RAOP discovery); `pin`
    /// is the PIN the receiver is currently displaying.
    #[must_use]
    pub fn new(username: impl Into<Vec<u8>>, pin: impl Into<Vec<u8>>) -> Self {
        Self {
            username: username.into(),
            pin: pin.into(),
            verifier: None,
            session_key: None,
        }
    }

    /// Build the `/pair-pin-start` request that makes the receiver display
    /// a PIN on screen.
    #[must_use]
    pub fn start_request(&self) -> RtspRequest {
        RtspRequest::builder(Method::Post, "/pair-pin-start").build()
    }

    /// Build the `/pair-setup-pin` request carrying `{method: "pin", user:
    /// UDN}`, requesting the device's `(salt, B)` challenge.
    #[must_use]
    pub fn challenge_request(&self) -> RtspRequest {
        let body = plist_dict! {
            "method" => "pin",
            "user" => String::from_utf8_lossy(&self.username).into_owned(),
        };
        RtspRequest::builder(Method::Post, "/pair-setup-pin")
            .body_plist(&body)
            .build()
    }

    /// Process the device's `{pk, salt}` response, run SRP-6a, and build
    /// the second `/pair-setup-pin` request carrying `{pk: A, proof: M1}`.
    ///
    /// # Errors
    /// Returns [`PinPairingError`] if the response is malformed or SRP
    /// fails (e.g. a degenerate server public key).
    pub fn process_challenge_response(
        &mut self,
        response_body: &[u8],
    ) -> Result<RtspRequest, PinPairingError> {
        let dict = decode(response_body)?;
        let server_public = dict_bytes(&dict, "pk")?;
        let salt = dict_bytes(&dict, "salt")?;

        let client = SrpClient::new(&SrpParams::RFC5054_2048)?;
        let verifier = client.process_challenge(&self.username, &self.pin, salt, server_public)?;

        let body = plist_dict! {
            "pk" => client.public_key().to_vec(),
            "proof" => verifier.client_proof().to_vec(),
        };

        self.verifier = Some(verifier);

        Ok(RtspRequest::builder(Method::Post, "/pair-setup-pin")
            .body_plist(&body)
            .build())
    }

    /// Verify the device's M2 proof, confirming it derived the same SRP
    /// session key (and therefore knows the displayed PIN) before this
    /// secret is trusted to wrap the new long-term auth key.
    ///
    /// # Errors
    /// Returns [`PinPairingError::ProofMismatch`] if the proof doesn't
    /// match, or [`PinPairingError::MissingField`] if called before
    /// [`Self::process_challenge_response`].
    pub fn verify_proof_response(&mut self, response_body: &[u8]) -> Result<(), PinPairingError> {
        let verifier = self
            .verifier
            .as_ref()
            .ok_or(PinPairingError::MissingField("verifier"))?;
        let dict = decode(response_body)?;
        let server_proof = dict_bytes(&dict, "proof")?;

        let session_key = verifier
            .verify_server(server_proof)
            .map_err(|_| PinPairingError::ProofMismatch)?;

        self.session_key = Some(session_key.as_bytes().to_vec());
        Ok(())
    }

    /// Generate a fresh Ed25519 auth keypair, wrap its public key with
    /// AES-128-GCM under keys derived from the SRP session key, and build
    /// the final `{epk, authTag}` POST body. Returns the request and the
    /// 32-byte Ed25519 secret to persist once the device acknowledges.
    ///
    /// # Errors
    /// Returns [`PinPairingError`] if called before
    /// [`Self::verify_proof_response`], or if AES-GCM sealing fails.
    pub fn finish(&self) -> Result<(RtspRequest, [u8; 32]), PinPairingError> {
        let session_key = self
            .session_key
            .as_ref()
            .ok_or(PinPairingError::MissingField("session_key"))?;

        let aes_key = derive_aes_field("Pair-Setup-AES-Key", session_key);
        let mut aes_iv = derive_aes_field("Pair-Setup-AES-IV", session_key);
        // The reference client increments the IV's least-significant byte
        // by one relative to the raw derivation before using it to wrap
        // the auth public key.
        aes_iv[15] = aes_iv[15].wrapping_add(1);

        let auth_keypair = Ed25519KeyPair::generate();
        let auth_secret = auth_keypair.secret_bytes();
        let auth_pub = *auth_keypair.public_key().as_bytes();

        let cipher = Aes128GcmLongNonce::new(&aes_key)?;
        let (epk, tag) = cipher.encrypt(&aes_iv, &auth_pub)?;

        let body = plist_dict! {
            "epk" => epk,
            "authTag" => tag.to_vec(),
        };

        let request = RtspRequest::builder(Method::Post, "/pair-setup-pin")
            .body_plist(&body)
            .build();

        Ok((request, auth_secret))
    }
}
