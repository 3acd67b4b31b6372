//! Sender-side NTP server on the timing UDP port.
//!
//! `AirPlay`-1 inverts the usual NTP client/server relationship: the
//! *receiver* polls the *sender* for the current time. This task answers
//! those polls so [`crate::receiver::drift::DriftCorrector`] on the other
//! end can keep its playback clock locked to the sender's.

use crate::protocol::rtp::timing::NtpTimestamp;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::{watch, Mutex};

const TIMING_REQUEST: u8 = 0x52;
const TIMING_RESPONSE: u8 = 0x53;
const REQUEST_MIN_LEN: usize = 32;

/// Answers timing requests (type `0x52`) on the sender's timing socket with
/// type `0x53` responses, per `spec.md` §4.2.
pub struct NtpServer {
    socket: Arc<UdpSocket>,
    /// Locked to the first peer seen, matching the reference sender which
    /// only ever talks to one receiver per session.
    peer: Mutex<Option<SocketAddr>>,
}

impl NtpServer {
    /// Build a server bound to an already-created timing socket.
    #[must_use]
    pub fn new(socket: Arc<UdpSocket>) -> Self {
        Self {
            socket,
            peer: Mutex::new(None),
        }
    }

    /// Peer address this server has locked onto, if any request has
    /// arrived yet.
    pub async fn peer(&self) -> Option<SocketAddr> {
        *self.peer.lock().await
    }

    /// Run the request/response loop until `shutdown` is set to `true`.
    ///
    /// # Errors
    /// Returns an I/O error if the socket itself fails (not if a single
    /// datagram is malformed; those are silently skipped).
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> std::io::Result<()> {
        let mut buf = [0u8; 64];
        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buf) => {
                    let (len, src) = result?;
                    if len < REQUEST_MIN_LEN {
                        continue;
                    }
                    self.lock_peer(src).await;
                    if let Some(response) = Self::build_response(&buf[..len]) {
                        let _ = self.socket.send_to(&response, src).await;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    async fn lock_peer(&self, src: SocketAddr) {
        let mut peer = self.peer.lock().await;
        if peer.is_none() {
            *peer = Some(src);
        }
    }

    /// Build the `0x53` reply for a raw `0x52` request datagram, or `None`
    /// if the datagram isn't a well-formed timing request.
    fn build_response(request: &[u8]) -> Option<Vec<u8>> {
        if request.len() < REQUEST_MIN_LEN {
            return None;
        }
        if request[1] & 0x7F != TIMING_REQUEST {
            return None;
        }

        let send_time = NtpTimestamp::decode(&request[24..32]);
        let now = NtpTimestamp::now();

        let mut response = vec![0u8; REQUEST_MIN_LEN];
        response[0] = 0x80;
        response[1] = TIMING_RESPONSE | 0x80;
        response[2] = request[2];
        response[3] = request[3];
        // ref_time = the request's own send_time.
        response[8..16].copy_from_slice(&send_time.encode());
        // recv_time = send_time = the instant we handled the request; a
        // real sender could not distinguish between them at this
        // granularity.
        response[16..24].copy_from_slice(&now.encode());
        response[24..32].copy_from_slice(&now.encode());

        Some(response)
    }
}
