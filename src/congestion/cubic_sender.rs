use std::{
    sync::{atomic::Ordering::Relaxed, Arc},
    time::Instant,
};

use crate::{
    bandwidth::Bandwidth,
    constants::{
        INITIAL_CONGESTION_WINDOW_PACKETS, LOSS_TOLERANCE_THRESHOLD, MAX_BURST_PACKETS,
        MAX_CONGESTION_WINDOW_PACKETS, MIN_CONGESTION_WINDOW_PACKETS, MIN_RATE_BITS_PER_SEC,
        MIN_RATE_FALLBACK_RTT,
    },
    metrics::METRICS,
    packet_number::PacketNumber,
    recorder::{CongestionState, CongestionStateRecorder},
    rtt::RttStats,
    stats::ConnectionStats,
};

use super::{
    cubic::Cubic, hybrid_slow_start::HybridSlowStart, pacer::Pacer, CongestionController,
};

const RENO_BETA: f32 = 0.7;

/// Loss-based sender: CUBIC window growth (or a simplified Reno fallback),
/// hybrid slow-start exit, and a pacer fed by the window/RTT bandwidth
/// estimate.
pub struct CubicSender {
    hybrid_slow_start: HybridSlowStart,
    rtt_stats: Arc<RttStats>,
    conn_stats: Arc<ConnectionStats>,
    cubic: Cubic,
    pacer: Pacer,

    reno: bool,

    largest_sent_packet_number: Option<PacketNumber>,
    largest_acked_packet_number: Option<PacketNumber>,
    largest_sent_at_last_cutback: Option<PacketNumber>,

    last_cutback_exited_slow_start: bool,
    congestion_window: u64,
    slow_start_threshold: u64,
    num_acked_packets: u64,

    initial_congestion_window: u64,
    initial_max_congestion_window: u64,

    max_datagram_size: u64,

    last_state: CongestionState,
    recorder: Option<Box<dyn CongestionStateRecorder>>,
}

impl core::fmt::Debug for CubicSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cwnd={},ssthresh={},slow_start={},recovery={},last_cutback_exited_slow_start={}",
            self.congestion_window,
            self.slow_start_threshold,
            self.in_slow_start(),
            self.in_recovery(),
            self.last_cutback_exited_slow_start
        )
    }
}

impl CubicSender {
    pub fn new(
        now: Instant,
        rtt_stats: Arc<RttStats>,
        conn_stats: Arc<ConnectionStats>,
        initial_max_datagram_size: u64,
        reno: bool,
        recorder: Option<Box<dyn CongestionStateRecorder>>,
    ) -> Self {
        let initial_congestion_window =
            INITIAL_CONGESTION_WINDOW_PACKETS * initial_max_datagram_size;
        let initial_max_congestion_window =
            MAX_CONGESTION_WINDOW_PACKETS * initial_max_datagram_size;
        let sender = Self {
            hybrid_slow_start: HybridSlowStart::default(),
            rtt_stats,
            conn_stats,
            cubic: Cubic::new(),
            pacer: Pacer::new(now, initial_max_datagram_size),
            reno,
            largest_sent_packet_number: None,
            largest_acked_packet_number: None,
            largest_sent_at_last_cutback: None,
            last_cutback_exited_slow_start: false,
            congestion_window: initial_congestion_window,
            slow_start_threshold: u64::MAX,
            num_acked_packets: 0,
            initial_congestion_window,
            initial_max_congestion_window,
            max_datagram_size: initial_max_datagram_size,
            last_state: CongestionState::SlowStart,
            recorder,
        };
        if let Some(recorder) = &sender.recorder {
            recorder.record_congestion_state(CongestionState::SlowStart);
        }
        sender
    }

    fn max_congestion_window(&self) -> u64 {
        self.max_datagram_size * MAX_CONGESTION_WINDOW_PACKETS
    }

    fn min_congestion_window(&self) -> u64 {
        self.max_datagram_size * MIN_CONGESTION_WINDOW_PACKETS
    }

    pub fn bandwidth_estimate(&self) -> Bandwidth {
        Bandwidth::from_window(self.window(), self.rtt_stats.smoothed_rtt())
    }

    fn maybe_record_state(&mut self, state: CongestionState) {
        match &self.recorder {
            Some(recorder) if state != self.last_state => {
                recorder.record_congestion_state(state);
                self.last_state = state;
            }
            _ => {}
        }
    }

    // Keeps the post-cutback window large enough to sustain the minimum rate
    // at the current RTT, and never below the structural minimum.
    fn apply_min_rate_protection(&mut self) {
        let mut srtt = self.rtt_stats.smoothed_rtt();
        if srtt.is_zero() {
            srtt = MIN_RATE_FALLBACK_RTT;
        }
        let min_cwnd = ((MIN_RATE_BITS_PER_SEC as f64 * srtt.as_secs_f64()) / 8.) as u64;
        let min_cwnd = min_cwnd.max(self.min_congestion_window());
        if self.congestion_window < min_cwnd {
            self.congestion_window = min_cwnd;
        }
    }

    fn is_cwnd_limited(&self, bytes_in_flight: u64) -> bool {
        let congestion_window = self.window();
        if bytes_in_flight >= congestion_window {
            return true;
        }
        let available_bytes = congestion_window - bytes_in_flight;
        let slow_start_limited = self.in_slow_start() && bytes_in_flight > congestion_window / 2;
        slow_start_limited || available_bytes <= MAX_BURST_PACKETS * self.max_datagram_size
    }

    fn maybe_increase_cwnd(&mut self, acked_bytes: u64, prior_in_flight: u64, event_time: Instant) {
        if !self.is_cwnd_limited(prior_in_flight) {
            self.cubic.on_application_limited();
            self.maybe_record_state(CongestionState::ApplicationLimited);
            METRICS.app_limited_events.increment(1);
            return;
        }
        if self.congestion_window >= self.max_congestion_window() {
            return;
        }
        if self.in_slow_start() {
            self.congestion_window += self.max_datagram_size;
            self.maybe_record_state(CongestionState::SlowStart);
            return;
        }
        self.maybe_record_state(CongestionState::CongestionAvoidance);
        if self.reno {
            // One extra datagram per window worth of acks.
            self.num_acked_packets += 1;
            if self.num_acked_packets >= self.congestion_window / self.max_datagram_size {
                self.congestion_window += self.max_datagram_size;
                self.num_acked_packets = 0;
            }
        } else {
            self.congestion_window = self.max_congestion_window().min(
                self.cubic.congestion_window_after_ack(
                    acked_bytes,
                    self.congestion_window,
                    self.rtt_stats.min_rtt(),
                    event_time,
                ),
            );
        }
    }

    pub fn on_connection_migration(&mut self) {
        self.hybrid_slow_start.restart();
        self.largest_sent_packet_number = None;
        self.largest_acked_packet_number = None;
        self.largest_sent_at_last_cutback = None;
        self.last_cutback_exited_slow_start = false;
        self.cubic.reset();
        self.num_acked_packets = 0;
        self.congestion_window = self.initial_congestion_window;
        self.slow_start_threshold = self.initial_max_congestion_window;
        METRICS.connection_migrations.increment(1);
    }
}

impl CongestionController for CubicSender {
    fn time_until_send(&self, now: Instant, _bytes_in_flight: u64) -> Option<Instant> {
        self.pacer.time_until_send(now, self.bandwidth_estimate())
    }

    fn has_pacing_budget(&self, now: Instant) -> bool {
        self.pacer.budget(now, self.bandwidth_estimate()) >= self.max_datagram_size
    }

    fn can_send(&self, bytes_in_flight: u64) -> bool {
        bytes_in_flight < self.window()
    }

    fn window(&self) -> u64 {
        self.congestion_window
    }

    fn on_packet_sent(
        &mut self,
        now: Instant,
        _bytes_in_flight: u64,
        packet_number: PacketNumber,
        bytes: u64,
        is_retransmittable: bool,
    ) {
        let bandwidth = self.bandwidth_estimate();
        self.pacer.sent_packet(now, bandwidth, bytes);
        if !is_retransmittable {
            return;
        }
        self.largest_sent_packet_number = Some(packet_number);
        self.hybrid_slow_start.on_packet_sent(packet_number);
    }

    fn on_packet_acked(
        &mut self,
        packet_number: PacketNumber,
        acked_bytes: u64,
        prior_in_flight: u64,
        event_time: Instant,
    ) {
        self.largest_acked_packet_number = self.largest_acked_packet_number.max(Some(packet_number));
        if self.in_recovery() {
            return;
        }
        self.maybe_increase_cwnd(acked_bytes, prior_in_flight, event_time);
        if self.in_slow_start() {
            self.hybrid_slow_start.on_packet_acked(packet_number);
        }
    }

    fn on_congestion_event(
        &mut self,
        packet_number: PacketNumber,
        lost_bytes: u64,
        _prior_in_flight: u64,
    ) {
        self.conn_stats.packets_lost.fetch_add(1, Relaxed);
        self.conn_stats.bytes_lost.fetch_add(lost_bytes, Relaxed);

        // Already cut back for this send window.
        if Some(packet_number) <= self.largest_sent_at_last_cutback {
            return;
        }

        // Below the cumulative tolerance this is jitter, not congestion.
        let total_sent = self.conn_stats.bytes_sent.load(Relaxed);
        let total_lost = self.conn_stats.bytes_lost.load(Relaxed);
        if total_sent > 0 && (total_lost as f64) / (total_sent as f64) < LOSS_TOLERANCE_THRESHOLD {
            METRICS.loss_events_ignored.increment(1);
            return;
        }

        self.last_cutback_exited_slow_start = self.in_slow_start();
        self.maybe_record_state(CongestionState::Recovery);

        if self.reno {
            self.congestion_window = (self.congestion_window as f32 * RENO_BETA) as u64;
        } else {
            self.congestion_window = self
                .cubic
                .congestion_window_after_packet_loss(self.congestion_window);
        }
        self.apply_min_rate_protection();
        self.slow_start_threshold = self.congestion_window;
        self.largest_sent_at_last_cutback = self.largest_sent_packet_number;
        self.num_acked_packets = 0;
        METRICS.cutbacks.increment(1);
    }

    fn on_retransmission_timeout(&mut self, packets_retransmitted: bool) {
        self.largest_sent_at_last_cutback = None;
        if !packets_retransmitted {
            return;
        }
        self.hybrid_slow_start.restart();
        self.cubic.reset();
        self.slow_start_threshold = self.congestion_window / 2;
        self.congestion_window = self.min_congestion_window();
        self.apply_min_rate_protection();
        METRICS.rto_collapses.increment(1);
    }

    fn maybe_exit_slow_start(&mut self) {
        if self.in_slow_start()
            && self.hybrid_slow_start.should_exit_slow_start(
                self.rtt_stats.latest_rtt(),
                self.rtt_stats.min_rtt(),
                self.window() / self.max_datagram_size,
            )
        {
            self.slow_start_threshold = self.congestion_window;
            self.maybe_record_state(CongestionState::CongestionAvoidance);
            METRICS.slow_start_exits.increment(1);
        }
    }

    fn in_slow_start(&self) -> bool {
        self.window() < self.slow_start_threshold
    }

    fn in_recovery(&self) -> bool {
        self.largest_acked_packet_number.is_some()
            && self.largest_acked_packet_number <= self.largest_sent_at_last_cutback
    }

    fn set_max_datagram_size(&mut self, bytes: u64) {
        if bytes < self.max_datagram_size {
            panic!(
                "congestion BUG: decreased max datagram size from {} to {}",
                self.max_datagram_size, bytes
            );
        }
        let cwnd_is_min_cwnd = self.congestion_window == self.min_congestion_window();
        self.max_datagram_size = bytes;
        if cwnd_is_min_cwnd {
            self.congestion_window = self.min_congestion_window();
        }
        self.pacer.set_max_datagram_size(bytes);
    }
}
