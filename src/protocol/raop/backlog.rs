//! Fixed-size retransmit backlog for the RAOP sender
//!
//! Every audio packet the sender frames is kept in a ring indexed by
//! `sequence % N` so that a retransmit request can be served in O(1)
//! without scanning a queue. The ring only remembers the most recent `N`
//! packets; a request for an older sequence is answered with nothing.

use super::super::rtp::raop::RaopAudioPacket;

/// Ring capacity. `AirPlay`-1 senders keep roughly the last two seconds of
/// audio (at ~1408 packets/sec for ALAC 352-sample frames this would be
/// much larger, but real senders use a much shorter window since
/// retransmits are only useful shortly after loss is detected).
pub const BACKLOG_SIZE: usize = 512;

/// A single backlog slot. `None` once the session is younger than
/// `BACKLOG_SIZE` packets, or after the ring has not yet wrapped around to
/// fill every slot.
#[derive(Debug, Clone)]
struct Slot {
    sequence: u16,
    packet: RaopAudioPacket,
}

/// Wrap-around retransmit ring for packets the sender has already sent.
///
/// Invariant: for any sequence `S` in the half-open window
/// `(last_sequence - N, last_sequence]`, if `backlog[S % N]` is occupied,
/// its stored sequence equals `S`. Pushing a new packet overwrites
/// whichever older packet previously lived at that index, which is always
/// correct because the ring is exactly `N` wide: the only sequence that
/// can collide at index `S % N` is `S - N`, `S - 2N`, etc., all of which
/// have already fallen out of the retransmit window.
pub struct SenderBacklog {
    slots: Vec<Option<Slot>>,
    last_sequence: Option<u16>,
}

impl SenderBacklog {
    /// Create an empty backlog with the default `AirPlay`-1 window size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(BACKLOG_SIZE)
    }

    /// Create an empty backlog with a custom ring size (mainly for tests).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            last_sequence: None,
        }
    }

    /// Ring capacity (`N`).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Store a freshly-sent packet, evicting whatever previously occupied
    /// its slot.
    pub fn push(&mut self, packet: RaopAudioPacket) {
        let sequence = packet.sequence;
        let index = sequence as usize % self.slots.len();
        self.slots[index] = Some(Slot { sequence, packet });
        self.last_sequence = Some(sequence);
    }

    /// Look up a previously-sent packet by sequence number.
    ///
    /// Returns `None` both when the slot was never filled and when it has
    /// since been overwritten by a newer packet with the same
    /// `sequence % N` (i.e. the requested sequence has aged out of the
    /// retransmit window).
    #[must_use]
    pub fn get(&self, sequence: u16) -> Option<&RaopAudioPacket> {
        let index = sequence as usize % self.slots.len();
        self.slots[index]
            .as_ref()
            .filter(|slot| slot.sequence == sequence)
            .map(|slot| &slot.packet)
    }

    /// Collect packets for a contiguous retransmit range `[seq_start,
    /// seq_start + count)`, skipping any sequence that has aged out or was
    /// never sent. Used to answer a retransmit-request control packet.
    #[must_use]
    pub fn get_range(&self, seq_start: u16, count: u16) -> Vec<&RaopAudioPacket> {
        (0..count)
            .filter_map(|offset| self.get(seq_start.wrapping_add(offset)))
            .collect()
    }

    /// Most recent sequence number pushed, if any.
    #[must_use]
    pub fn last_sequence(&self) -> Option<u16> {
        self.last_sequence
    }

    /// Return up to `count` of the most recently pushed packets, oldest
    /// first, skipping any sequence that has already aged out of the ring.
    /// Used by the pause-resume replay path to re-send the tail of the
    /// backlog under fresh sequence numbers.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<RaopAudioPacket> {
        let Some(last) = self.last_sequence else {
            return Vec::new();
        };
        let count = count.min(self.slots.len());
        let mut out = Vec::with_capacity(count);
        for back in (0..count).rev() {
            #[allow(clippy::cast_possible_truncation, reason = "back < slots.len() <= u16::MAX")]
            let seq = last.wrapping_sub(back as u16);
            if let Some(packet) = self.get(seq) {
                out.push(packet.clone());
            }
        }
        out
    }

    /// Drop every stored packet, e.g. on FLUSH. The next pushed packet
    /// starts a fresh window.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.last_sequence = None;
    }
}

impl Default for SenderBacklog {
    fn default() -> Self {
        Self::new()
    }
}
