use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{metrics::METRICS, packet_number::PacketNumber, rtt::RttStats};

use super::CongestionController;

const RTT_WINDOW_SIZE: usize = 10;
// The rate never drops below 1 Mbps.
const MIN_START_BPS: u64 = 1024 * 1024 / 8;
const DEFAULT_MBPS: i64 = 10;

/// Rate-targeting sender: paces to a user-declared ceiling instead of
/// probing for one, with RTT-tiered loss tolerance and jitter suppression.
/// Standard congestion signals below the loss threshold are ignored.
#[derive(Debug)]
pub struct HysteriaSender {
    rtt_stats: Arc<RttStats>,

    target_bps: u64,
    current_bps: u64,
    // Last rate that survived a loss check.
    stable_bps: u64,

    max_datagram_size: u64,
    next_send_time: Instant,

    rtt_history: [Duration; RTT_WINDOW_SIZE],
    rtt_idx: usize,
    max_rtt: Duration,

    // Negative during a punish interval.
    rtt_count: i32,
}

impl HysteriaSender {
    pub fn new(
        now: Instant,
        rtt_stats: Arc<RttStats>,
        initial_max_datagram_size: u64,
        mbps: i64,
    ) -> Self {
        let mbps = if mbps <= 0 { DEFAULT_MBPS } else { mbps };
        let target_bps = mbps as u64 * 1024 * 1024 / 8;

        // Start below the target; very high targets start at a flat 100 Mbps.
        let initial_bps = if mbps > 100 {
            100 * 1024 * 1024 / 8
        } else {
            (target_bps as f64 * 0.6) as u64
        };
        let initial_bps = initial_bps.max(MIN_START_BPS);

        Self {
            rtt_stats,
            target_bps,
            current_bps: initial_bps,
            stable_bps: initial_bps,
            max_datagram_size: initial_max_datagram_size,
            // Backdated so the first burst leaves unpaced.
            next_send_time: now
                .checked_sub(Duration::from_millis(100))
                .unwrap_or(now),
            rtt_history: [Duration::ZERO; RTT_WINDOW_SIZE],
            rtt_idx: 0,
            max_rtt: Duration::ZERO,
            rtt_count: 0,
        }
    }

    fn update_rtt_and_check_jitter(&mut self) {
        let rtt = self.rtt_stats.latest_rtt();
        if rtt.is_zero() {
            return;
        }

        self.rtt_history[self.rtt_idx] = rtt;
        self.rtt_idx = (self.rtt_idx + 1) % RTT_WINDOW_SIZE;
        if rtt > self.max_rtt {
            self.max_rtt = rtt;
        }

        // A latest-RTT spike past twice the smoothed RTT reads as queue
        // build-up: back off before the buffers do.
        let smoothed = self.rtt_stats.smoothed_rtt();
        if smoothed > Duration::from_millis(20) && rtt > smoothed * 2 {
            self.current_bps = ((self.current_bps as f64 * 0.85) as u64).max(MIN_START_BPS);
            METRICS.hysteria_jitter_suppressions.increment(1);
        }
    }
}

impl CongestionController for HysteriaSender {
    fn time_until_send(&self, now: Instant, bytes_in_flight: u64) -> Option<Instant> {
        if bytes_in_flight >= self.window() {
            return Some(now + Duration::from_secs(3600));
        }
        if self.next_send_time > now + Duration::from_millis(1) {
            return Some(self.next_send_time);
        }
        None
    }

    fn has_pacing_budget(&self, now: Instant) -> bool {
        self.next_send_time <= now + Duration::from_millis(1)
    }

    fn can_send(&self, bytes_in_flight: u64) -> bool {
        bytes_in_flight < self.window()
    }

    fn window(&self) -> u64 {
        let rtt = self.rtt_stats.smoothed_rtt();
        if rtt.is_zero() {
            return 1024 * 1024;
        }

        // A tighter multiplier at high RTT forces an evener send rhythm.
        let multiplier = if rtt >= Duration::from_millis(180) {
            1.1
        } else if rtt >= Duration::from_millis(100) {
            1.3
        } else {
            1.5
        };

        let cwnd = (self.current_bps as f64 * rtt.as_secs_f64() * multiplier) as u64;
        cwnd.max(32 * self.max_datagram_size)
    }

    fn on_packet_sent(
        &mut self,
        now: Instant,
        _bytes_in_flight: u64,
        _packet_number: PacketNumber,
        bytes: u64,
        _is_retransmittable: bool,
    ) {
        let interval =
            Duration::from_nanos((bytes as u128 * 1_000_000_000 / self.current_bps as u128) as u64);
        self.next_send_time = self.next_send_time.max(now) + interval;

        // Pacing debt never runs further ahead than half an RTT, with a
        // 20 ms floor.
        let limit = Duration::from_millis(20).max(self.rtt_stats.latest_rtt() / 2);
        self.next_send_time = self.next_send_time.min(now + limit);
    }

    fn on_packet_acked(
        &mut self,
        _packet_number: PacketNumber,
        _acked_bytes: u64,
        _prior_in_flight: u64,
        _event_time: Instant,
    ) {
        self.update_rtt_and_check_jitter();

        // Long fat pipes climb in bigger steps.
        let grow_factor = if self.rtt_stats.smoothed_rtt() > Duration::from_millis(150) {
            1.25
        } else {
            1.1
        };

        self.rtt_count += 1;
        if self.rtt_count >= 4 {
            self.rtt_count = 0;
            if self.current_bps < self.target_bps {
                self.current_bps =
                    ((self.current_bps as f64 * grow_factor) as u64).min(self.target_bps);
            }
        }
    }

    fn on_congestion_event(
        &mut self,
        _packet_number: PacketNumber,
        lost_bytes: u64,
        prior_in_flight: u64,
    ) {
        let rtt = self.rtt_stats.smoothed_rtt();

        // Loss tolerance rises with RTT.
        let threshold = if rtt < Duration::from_millis(50) {
            0.10
        } else if rtt < Duration::from_millis(100) {
            0.15
        } else if rtt < Duration::from_millis(180) {
            0.20
        } else {
            0.30
        };

        let loss_rate = lost_bytes as f64 / (prior_in_flight + 1) as f64;

        if loss_rate > threshold {
            self.current_bps = ((self.stable_bps as f64 * 0.75) as u64).max(MIN_START_BPS);
            // Punish interval: the next two growth ticks are skipped.
            self.rtt_count = -2;
            METRICS.hysteria_punish_events.increment(1);
        } else {
            self.stable_bps = self.current_bps;
        }
    }

    fn on_retransmission_timeout(&mut self, _packets_retransmitted: bool) {
        self.current_bps = MIN_START_BPS;
    }

    fn maybe_exit_slow_start(&mut self) {}

    fn in_slow_start(&self) -> bool {
        false
    }

    fn in_recovery(&self) -> bool {
        false
    }

    fn set_max_datagram_size(&mut self, bytes: u64) {
        if bytes < self.max_datagram_size {
            panic!(
                "congestion BUG: decreased max datagram size from {} to {}",
                self.max_datagram_size, bytes
            );
        }
        self.max_datagram_size = bytes;
    }
}
