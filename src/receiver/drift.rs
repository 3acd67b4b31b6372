//! Receiver-side clock drift correction.
//!
//! Tracks the sender's clock via periodic NTP-style exchanges on the
//! timing port, anchors the incoming RTP stream to wall-clock time from
//! sync packets, and nudges playback by duplicating or dropping a single
//! frame when the sender's and receiver's clocks have drifted apart by
//! more than a few milliseconds.

use super::timing::NtpTimestamp;
use std::time::Duration;

/// Drift magnitude, in microseconds, a single running sum must exceed
/// before a correction is considered.
pub const GAP_THRESHOLD_MICROS: i64 = 8_000;
/// Number of consecutive over-threshold samples required before a
/// correction actually fires.
pub const GAP_COUNT_THRESHOLD: u32 = 20;
/// Timing round trips slower than this are discarded as outliers rather
/// than folded into the drift estimate.
pub const ROUND_TRIP_CEILING: Duration = Duration::from_millis(100);

/// What the jitter buffer should do in response to an accumulated drift
/// correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftAction {
    /// The sender is running fast relative to us: duplicate the previous
    /// output frame to slow playback down by one frame period.
    DuplicateFrame,
    /// The sender is running slow relative to us: drop one frame to speed
    /// playback up by one frame period.
    DropFrame,
}

/// One end of the learned sender/receiver clock mapping: "sender time
/// `remote` corresponds to our local time `local`".
#[derive(Debug, Clone, Copy)]
struct TimingSample {
    remote: NtpTimestamp,
    local: NtpTimestamp,
}

/// Anchor mapping an RTP timestamp to wall-clock playback time, learned
/// from sync packets.
#[derive(Debug, Clone, Copy)]
struct Synchro {
    rtp: u32,
    time: NtpTimestamp,
}

/// Running statistics, kept even when drift *correction* is disabled so
/// the session can still be observed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriftStats {
    /// Timing exchanges folded into the drift estimate.
    pub samples: u32,
    /// Timing exchanges discarded for exceeding the round-trip ceiling.
    pub discarded_outliers: u32,
    /// Corrections actually applied (duplicate or drop).
    pub corrections_applied: u32,
}

/// Receiver-side drift corrector: NTP client bookkeeping plus the
/// sync-packet synchro anchor and the duplicate/drop correction rule.
pub struct DriftCorrector {
    sample_rate: u32,
    latency_frames: Option<u32>,
    correction_enabled: bool,
    timing: Option<TimingSample>,
    synchro: Option<Synchro>,
    drift_sum_micros: i64,
    gap_count: u32,
    ntp_sync: bool,
    rtp_sync: bool,
    stats: DriftStats,
}

impl DriftCorrector {
    /// Build a corrector for a stream at `sample_rate`, with `latency_frames`
    /// the expected end-to-end buffering depth used to anchor sync packets.
    #[must_use]
    pub fn new(sample_rate: u32, latency_frames: u32) -> Self {
        Self {
            sample_rate,
            latency_frames: Some(latency_frames),
            correction_enabled: true,
            timing: None,
            synchro: None,
            drift_sum_micros: 0,
            gap_count: 0,
            ntp_sync: false,
            rtp_sync: false,
            stats: DriftStats::default(),
        }
    }

    /// Disable actual frame duplication/dropping while still accumulating
    /// statistics (e.g. for diagnostics-only sessions).
    pub fn set_correction_enabled(&mut self, enabled: bool) {
        self.correction_enabled = enabled;
    }

    /// Whether at least one NTP exchange has completed.
    #[must_use]
    pub fn ntp_synced(&self) -> bool {
        self.ntp_sync
    }

    /// Whether both an NTP exchange and a sync packet have been seen.
    #[must_use]
    pub fn rtp_synced(&self) -> bool {
        self.rtp_sync
    }

    /// Read-only statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> DriftStats {
        self.stats
    }

    /// Current running drift sum, in microseconds (positive: sender fast).
    #[must_use]
    pub fn drift_sum_micros(&self) -> i64 {
        self.drift_sum_micros
    }

    /// Process one timing-port round trip: `reference` is when we sent the
    /// request, `remote_receive`/`remote_transmit` are the sender's
    /// reported receive/send times, `now` is when we received the reply.
    pub fn on_timing_response(
        &mut self,
        reference: NtpTimestamp,
        remote_receive: NtpTimestamp,
        remote_transmit: NtpTimestamp,
        now: NtpTimestamp,
    ) -> Option<DriftAction> {
        let _ = remote_receive;
        let round_trip_micros = now.diff_micros(&reference);
        #[allow(clippy::cast_possible_truncation, reason = "ceiling is a small constant")]
        let ceiling_micros = ROUND_TRIP_CEILING.as_micros() as i64;
        if round_trip_micros < 0 || round_trip_micros > ceiling_micros {
            self.stats.discarded_outliers += 1;
            return None;
        }

        let mut action = None;
        if let Some(previous) = self.timing {
            let elapsed_local_micros = reference.diff_micros(&previous.local);
            let expected_remote = NtpTimestamp::from_micros(previous.remote.to_micros() + elapsed_local_micros);
            let delta_micros = expected_remote.diff_micros(&remote_transmit);
            self.drift_sum_micros += delta_micros;
            self.stats.samples += 1;
            action = self.maybe_correct();
        }

        self.timing = Some(TimingSample {
            remote: remote_transmit,
            local: reference,
        });
        self.ntp_sync = true;
        action
    }

    fn maybe_correct(&mut self) -> Option<DriftAction> {
        if self.drift_sum_micros.abs() < GAP_THRESHOLD_MICROS {
            self.gap_count = 0;
            return None;
        }
        self.gap_count += 1;
        if self.gap_count <= GAP_COUNT_THRESHOLD {
            return None;
        }
        self.gap_count = 0;

        let action = if self.drift_sum_micros > 0 {
            self.drift_sum_micros -= GAP_THRESHOLD_MICROS;
            DriftAction::DuplicateFrame
        } else {
            self.drift_sum_micros += GAP_THRESHOLD_MICROS;
            DriftAction::DropFrame
        };

        if !self.correction_enabled {
            return None;
        }
        self.stats.corrections_applied += 1;
        Some(action)
    }

    /// Learn/refresh the synchro anchor from a sync packet: `carried_rtp`
    /// is the RTP timestamp currently playing at the sender, `carried_ntp`
    /// the sender's wall-clock time for it.
    pub fn on_sync_packet(&mut self, carried_rtp: u32, carried_ntp: NtpTimestamp) {
        let latency = self.latency_frames.unwrap_or(0);
        let synchro_rtp = carried_rtp.wrapping_sub(latency);

        let synchro_time = if let Some(timing) = self.timing {
            let ntp_diff_micros = carried_ntp.diff_micros(&timing.remote);
            NtpTimestamp::from_micros(timing.local.to_micros() + ntp_diff_micros)
        } else {
            carried_ntp
        };

        self.synchro = Some(Synchro {
            rtp: synchro_rtp,
            time: synchro_time,
        });
        if self.timing.is_some() {
            self.rtp_sync = true;
        }
    }

    /// Wall-clock playback target for the packet carrying RTP timestamp
    /// `packet_rtp`, if the synchro anchor has been learned yet.
    #[must_use]
    pub fn target_play_time(&self, packet_rtp: u32) -> Option<NtpTimestamp> {
        let synchro = self.synchro?;
        #[allow(clippy::cast_possible_wrap, reason = "RTP timestamps fit comfortably in i64")]
        let delta_frames = i64::from(packet_rtp.wrapping_sub(synchro.rtp) as i32);
        let delta_micros = delta_frames * 1_000_000 / i64::from(self.sample_rate.max(1));
        Some(NtpTimestamp::from_micros(
            synchro.time.to_micros() + delta_micros,
        ))
    }

    /// Whether the packet carrying RTP timestamp `packet_rtp` is eligible
    /// to drain now: either its wall-clock target has arrived, or there is
    /// already ready, non-empty buffered audio to avoid underrunning.
    #[must_use]
    pub fn drain_eligible(
        &self,
        packet_rtp: u32,
        now: NtpTimestamp,
        slot_ready: bool,
        buffer_nonempty: bool,
    ) -> bool {
        match self.target_play_time(packet_rtp) {
            Some(target) => now.to_micros() >= target.to_micros() || (slot_ready && buffer_nonempty),
            None => slot_ready && buffer_nonempty,
        }
    }
}
