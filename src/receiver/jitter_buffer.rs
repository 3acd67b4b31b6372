//! Fixed-size ring jitter buffer for incoming audio packets.
//!
//! Mirrors the classic `ab_write`/`ab_read` two-pointer ring used by RAOP
//! receivers: packets are written into `sequence % BUFFER_SIZE` slots and
//! drained in order by a separate read cursor, with recovery rules for
//! packets that arrive wildly out of position and a proactive resend pass
//! that asks the sender for anything still missing once it has aged past
//! a short dead-band.

use crate::protocol::rtp::control::RetransmitRequest;
use crate::receiver::rtp_receiver::AudioPacket;
use std::time::{Duration, Instant};

/// Ring capacity, in packets.
pub const BUFFER_SIZE: usize = 2048;
/// How long a missing slot is tolerated before it is worth NACKing.
pub const RESEND_DEAD_BAND: Duration = Duration::from_millis(150);
/// How many slots ahead of the read cursor the proactive resend walk scans
/// per call.
pub const RESEND_WALK_SLOTS: usize = 64;

/// Decodes a payload (e.g. ALAC) into interleaved PCM samples.
///
/// Kept as a trait so the buffer itself has no codec dependency; callers
/// wire in whatever decoder matches the negotiated format.
pub trait FrameDecoder: Send {
    /// Decode one packet's payload into PCM samples.
    ///
    /// # Errors
    /// Returns an error description if the payload cannot be decoded.
    fn decode(&mut self, payload: &[u8]) -> Result<Vec<i16>, String>;
}

/// Decoder that assumes the payload is already PCM and passes it through
/// unchanged, reinterpreting bytes as little-endian `i16` samples.
#[derive(Debug, Default)]
pub struct PassthroughDecoder;

impl FrameDecoder for PassthroughDecoder {
    fn decode(&mut self, payload: &[u8]) -> Result<Vec<i16>, String> {
        Ok(payload
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect())
    }
}

#[derive(Clone)]
struct Slot {
    packet: AudioPacket,
    arrived_at: Instant,
}

/// Outcome of offering a packet to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Accepted into a fresh slot.
    Accepted,
    /// Accepted, and the read cursor was forced forward to recover from a
    /// too-far-behind write.
    AcceptedWithRecovery,
    /// Duplicate of a slot already filled.
    Duplicate,
    /// Older than the read cursor by more than the buffer size; dropped.
    TooLate,
}

/// Ring jitter buffer keyed by RTP sequence number.
pub struct JitterBuffer {
    slots: Box<[Option<Slot>; BUFFER_SIZE]>,
    /// When each currently-empty slot first became expected but missing,
    /// so the proactive resend pass can apply the NACK dead-band.
    gap_since: Box<[Option<Instant>; BUFFER_SIZE]>,
    ab_write: u16,
    ab_read: u16,
    started: bool,
    packets_received: u64,
    packets_dropped_late: u64,
    packets_recovered: u64,
}

/// Wraparound-aware "is `a` strictly after `b`" comparison for RTP u16
/// sequence numbers.
#[must_use]
pub fn seq_gt(a: u16, b: u16) -> bool {
    a.wrapping_sub(b) != 0 && a.wrapping_sub(b) < 0x8000
}

/// Wraparound-aware "is `a` strictly before `b`".
#[must_use]
pub fn seq_lt(a: u16, b: u16) -> bool {
    seq_gt(b, a)
}

impl JitterBuffer {
    /// Build an empty buffer. The read/write cursors are set on the first
    /// accepted packet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Box::new(std::array::from_fn(|_| None)),
            gap_since: Box::new(std::array::from_fn(|_| None)),
            ab_write: 0,
            ab_read: 0,
            started: false,
            packets_received: 0,
            packets_dropped_late: 0,
            packets_recovered: 0,
        }
    }

    fn index(seq: u16) -> usize {
        seq as usize % BUFFER_SIZE
    }

    /// Total packets accepted or rejected so far.
    #[must_use]
    pub fn packets_received(&self) -> u64 {
        self.packets_received
    }

    /// Packets dropped for arriving too far behind the read cursor.
    #[must_use]
    pub fn packets_dropped_late(&self) -> u64 {
        self.packets_dropped_late
    }

    /// Times the read cursor was force-advanced to recover from a
    /// too-far-ahead write.
    #[must_use]
    pub fn packets_recovered(&self) -> u64 {
        self.packets_recovered
    }

    /// Number of filled slots currently buffered.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// `ab_write`/`ab_read` accept rule: write `packet` into its slot,
    /// recovering the read cursor if the writer has run too far ahead.
    pub fn ab_write(&mut self, packet: AudioPacket) -> WriteOutcome {
        self.packets_received += 1;
        let seq = packet.sequence;

        if !self.started {
            self.started = true;
            self.ab_read = seq;
            self.ab_write = seq;
        }

        if self.slots[Self::index(seq)]
            .as_ref()
            .is_some_and(|slot| slot.packet.sequence == seq)
        {
            return WriteOutcome::Duplicate;
        }

        let distance_behind = self.ab_read.wrapping_sub(seq);
        let is_behind = seq_lt(seq, self.ab_read);
        if is_behind && usize::from(distance_behind) >= BUFFER_SIZE {
            self.packets_dropped_late += 1;
            return WriteOutcome::TooLate;
        }

        let mut outcome = WriteOutcome::Accepted;
        let distance_ahead = seq.wrapping_sub(self.ab_write);
        if seq_gt(seq, self.ab_write) && usize::from(distance_ahead) >= BUFFER_SIZE {
            // The sender has run far enough ahead of us that our window
            // can no longer hold the gap: drop what's buffered and jump
            // the read cursor up to resynchronize.
            for slot in self.slots.iter_mut() {
                *slot = None;
            }
            for gap in self.gap_since.iter_mut() {
                *gap = None;
            }
            self.ab_read = seq;
            self.packets_recovered += 1;
            outcome = WriteOutcome::AcceptedWithRecovery;
        } else if seq_gt(seq, self.ab_write) {
            // New slots opened up between the old write cursor and this
            // packet are now expected but missing.
            let now = Instant::now();
            let mut pending = self.ab_write;
            while pending != seq {
                self.gap_since[Self::index(pending)].get_or_insert(now);
                pending = pending.wrapping_add(1);
            }
        }

        if seq_gt(seq, self.ab_write) || !self.started || self.ab_write == seq {
            self.ab_write = seq.wrapping_add(1);
        }

        self.slots[Self::index(seq)] = Some(Slot {
            packet,
            arrived_at: Instant::now(),
        });
        self.gap_since[Self::index(seq)] = None;
        outcome
    }

    /// Drain the next packet in sequence order, if its slot is filled.
    /// Advances the read cursor regardless, so a persistently missing
    /// packet doesn't stall the stream forever once the caller decides to
    /// skip it (e.g. after `mark_missing_as_lost`).
    pub fn ab_read(&mut self) -> Option<AudioPacket> {
        if seq_lt(self.ab_read, self.ab_write) || self.ab_read == self.ab_write {
            let idx = Self::index(self.ab_read);
            let slot = self.slots[idx].take()?;
            self.gap_since[idx] = None;
            self.ab_read = self.ab_read.wrapping_add(1);
            Some(slot.packet)
        } else {
            None
        }
    }

    /// Force the read cursor past a slot that will never arrive (e.g. the
    /// sender acknowledged it can't retransmit it), without requiring a
    /// packet to be present.
    pub fn skip_missing(&mut self) {
        if seq_lt(self.ab_read, self.ab_write) {
            self.gap_since[Self::index(self.ab_read)] = None;
            self.ab_read = self.ab_read.wrapping_add(1);
        }
    }

    /// Whether the slot at the read cursor is filled and ready to drain.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.slots[Self::index(self.ab_read)].is_some()
    }

    /// Scan the next `RESEND_WALK_SLOTS` slots ahead of the read cursor
    /// for gaps older than `RESEND_DEAD_BAND`, and build grouped NACK
    /// requests for consecutive missing ranges.
    #[must_use]
    pub fn proactive_resend(&self) -> Vec<RetransmitRequest> {
        if !self.started || self.ab_read == self.ab_write {
            return Vec::new();
        }

        let now = Instant::now();
        let mut requests = Vec::new();
        let mut run_start: Option<u16> = None;
        let mut run_len: u16 = 0;

        let walk_len = RESEND_WALK_SLOTS.min(
            usize::from(self.ab_write.wrapping_sub(self.ab_read)).max(1),
        );

        for step in 0..walk_len {
            #[allow(clippy::cast_possible_truncation, reason = "walk length bounded by BUFFER_SIZE")]
            let seq = self.ab_read.wrapping_add(step as u16);
            if seq == self.ab_write {
                break;
            }

            let aged_out = self.gap_since[Self::index(seq)]
                .is_some_and(|since| now.duration_since(since) >= RESEND_DEAD_BAND);

            if aged_out {
                match run_start {
                    Some(_) => run_len += 1,
                    None => {
                        run_start = Some(seq);
                        run_len = 1;
                    }
                }
            } else if let Some(start) = run_start.take() {
                requests.push(RetransmitRequest::new(start, run_len));
            }
        }
        if let Some(start) = run_start {
            requests.push(RetransmitRequest::new(start, run_len));
        }
        requests
    }

    /// Decode and drain every ready packet in order, in one pass.
    pub fn drain_ready(&mut self, decoder: &mut dyn FrameDecoder) -> Vec<Result<Vec<i16>, String>> {
        let mut out = Vec::new();
        while self.ready() {
            if let Some(packet) = self.ab_read() {
                out.push(decoder.decode(&packet.audio_data));
            }
        }
        out
    }
}

impl Default for JitterBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(seq: u16, ts: u32) -> AudioPacket {
        AudioPacket {
            sequence: seq,
            timestamp: ts,
            ssrc: 1,
            audio_data: vec![0, 0, 1, 0],
            received_at: Instant::now(),
        }
    }

    #[test]
    fn seq_gt_handles_wraparound() {
        assert!(seq_gt(1, 0));
        assert!(seq_gt(0, 65535));
        assert!(!seq_gt(65535, 0));
        assert!(seq_lt(65535, 0));
    }

    #[test]
    fn first_write_seeds_cursors_and_is_immediately_readable() {
        let mut buf = JitterBuffer::new();
        assert_eq!(buf.ab_write(packet(100, 0)), WriteOutcome::Accepted);
        assert!(buf.ready());
        let out = buf.ab_read().unwrap();
        assert_eq!(out.sequence, 100);
    }

    #[test]
    fn in_order_sequence_drains_in_order() {
        let mut buf = JitterBuffer::new();
        for seq in 0..10u16 {
            buf.ab_write(packet(seq, u32::from(seq) * 352));
        }
        for seq in 0..10u16 {
            let packet = buf.ab_read().unwrap();
            assert_eq!(packet.sequence, seq);
        }
    }

    #[test]
    fn out_of_order_packet_is_buffered_and_drains_once_gap_fills() {
        let mut buf = JitterBuffer::new();
        buf.ab_write(packet(0, 0));
        buf.ab_write(packet(2, 704));
        // Sequence 1 hasn't arrived: nothing past 0 is ready yet.
        assert_eq!(buf.ab_read().unwrap().sequence, 0);
        assert!(!buf.ready());
        buf.ab_write(packet(1, 352));
        assert_eq!(buf.ab_read().unwrap().sequence, 1);
        assert_eq!(buf.ab_read().unwrap().sequence, 2);
    }

    #[test]
    fn duplicate_write_is_reported_and_does_not_disturb_state() {
        let mut buf = JitterBuffer::new();
        buf.ab_write(packet(5, 0));
        assert_eq!(buf.ab_write(packet(5, 0)), WriteOutcome::Duplicate);
    }

    #[test]
    fn write_older_than_buffer_size_behind_read_cursor_is_too_late() {
        let mut buf = JitterBuffer::new();
        buf.ab_write(packet(5000, 0));
        let stale = 5000u16.wrapping_sub(BUFFER_SIZE as u16 + 1);
        assert_eq!(buf.ab_write(packet(stale, 0)), WriteOutcome::TooLate);
        assert_eq!(buf.packets_dropped_late(), 1);
    }

    #[test]
    fn write_far_ahead_of_writer_triggers_recovery_and_resets_read_cursor() {
        let mut buf = JitterBuffer::new();
        buf.ab_write(packet(0, 0));
        let far_future = (BUFFER_SIZE as u16) + 10;
        let outcome = buf.ab_write(packet(far_future, 0));
        assert_eq!(outcome, WriteOutcome::AcceptedWithRecovery);
        assert_eq!(buf.packets_recovered(), 1);
        assert_eq!(buf.ab_read().unwrap().sequence, far_future);
    }

    #[test]
    fn proactive_resend_is_silent_inside_the_dead_band() {
        let mut buf = JitterBuffer::new();
        buf.ab_write(packet(0, 0));
        buf.ab_write(packet(1, 352));
        // 2, 3, 4 missing, but not yet aged past the dead-band.
        buf.ab_write(packet(5, 5 * 352));
        assert!(buf.proactive_resend().is_empty());
    }

    #[test]
    fn proactive_resend_groups_consecutive_missing_sequences_past_dead_band() {
        let mut buf = JitterBuffer::new();
        buf.ab_write(packet(0, 0));
        buf.ab_write(packet(1, 352));
        // 2, 3, 4 missing
        buf.ab_write(packet(5, 5 * 352));
        std::thread::sleep(RESEND_DEAD_BAND + Duration::from_millis(10));
        let requests = buf.proactive_resend();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].sequence_start, 2);
        assert_eq!(requests[0].count, 3);
    }

    #[test]
    fn passthrough_decoder_reinterprets_payload_as_pcm() {
        let mut decoder = PassthroughDecoder;
        let samples = decoder.decode(&[0x01, 0x00, 0xff, 0xff]).unwrap();
        assert_eq!(samples, vec![1, -1]);
    }

    #[test]
    fn scenario_b_recovers_at_least_98_percent_of_a_2_percent_uniform_loss_via_retransmit() {
        use rand::{Rng, SeedableRng, rngs::StdRng};
        use std::collections::HashSet;

        const TOTAL: u16 = 1000;
        let mut rng = StdRng::seed_from_u64(0xB_CAFE);

        let mut buf = JitterBuffer::new();
        let mut dropped = HashSet::new();
        for seq in 0..TOTAL {
            // Sequence 0 seeds the cursors, and the last sequence guarantees
            // every earlier gap gets opened (and so dated) by something
            // arriving after it; a drop at either end is never "discovered"
            // and would be unrecoverable by construction, not a deficiency
            // in the recovery path being tested here.
            if seq != 0 && seq != TOTAL - 1 && rng.gen_bool(0.02) {
                dropped.insert(seq);
                continue;
            }
            buf.ab_write(packet(seq, u32::from(seq) * 352));
        }
        assert!(!dropped.is_empty(), "this run exercised no loss at all, reroll the seed");

        // Every gap's `gap_since` stamp was taken at write time above, so a
        // single sleep past the dead-band ages out every current gap at once.
        std::thread::sleep(RESEND_DEAD_BAND + Duration::from_millis(20));

        let mut seen = Vec::new();
        // Each pass answers the NACKs inside the next resend walk and drains
        // whatever that unblocks, advancing the window for the next pass.
        for _ in 0..(usize::from(TOTAL) / RESEND_WALK_SLOTS + 4) {
            for req in buf.proactive_resend() {
                for i in 0..req.count {
                    let seq = req.sequence_start.wrapping_add(i);
                    buf.ab_write(packet(seq, u32::from(seq) * 352));
                }
            }
            while let Some(p) = buf.ab_read() {
                seen.push(p.sequence);
            }
        }

        let mut dedup = seen.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), seen.len(), "no duplicate sequence delivered to the decoder");

        let recovered = seen.len();
        let required = (f64::from(TOTAL) * 0.98).ceil() as usize;
        assert!(
            recovered >= required,
            "expected at least {required} of {TOTAL} frames recovered within the dead-band, got {recovered}"
        );
    }

    #[test]
    fn skip_missing_advances_read_cursor_without_a_packet() {
        let mut buf = JitterBuffer::new();
        buf.ab_write(packet(0, 0));
        buf.ab_write(packet(2, 704));
        assert!(buf.ab_read().is_some());
        assert!(!buf.ready());
        buf.skip_missing();
        assert!(buf.ready());
        assert_eq!(buf.ab_read().unwrap().sequence, 2);
    }
}
