use std::time::{Duration, Instant};

use crate::constants::INITIAL_MAX_DATAGRAM_SIZE;

// Fixed-point CUBIC per RFC 8312. Time runs in 2^10 fractions of a second so
// a 10-bit shift divides; the window scale keeps the whole cube in integer
// math with a 40-bit shift at the end.
const CUBE_SCALE: u32 = 40;
const CUBE_CONGESTION_WINDOW_SCALE: u64 = 410;
const CUBE_FACTOR: u64 =
    (1u64 << CUBE_SCALE) / CUBE_CONGESTION_WINDOW_SCALE / INITIAL_MAX_DATAGRAM_SIZE;

const DEFAULT_NUM_CONNECTIONS: u32 = 1;

const BETA: f32 = 0.7;
// Extra shrink of last-max when loss strikes below it, RFC 8312 section 4.6
// (fast convergence).
const BETA_LAST_MAX: f32 = 0.85;

#[derive(Debug, Clone)]
pub struct Cubic {
    num_connections: u32,

    // `None` means the curve restarts from the current window on the next
    // ack.
    epoch: Option<Instant>,
    last_max_congestion_window: u64,
    acked_bytes_count: u64,
    estimated_tcp_congestion_window: u64,
    origin_point_congestion_window: u64,
    // In 2^10 fractions of a second.
    time_to_origin_point: u32,
    last_target_congestion_window: u64,
}

impl Default for Cubic {
    fn default() -> Self {
        Self::new()
    }
}

impl Cubic {
    pub fn new() -> Self {
        Self {
            num_connections: DEFAULT_NUM_CONNECTIONS,
            epoch: None,
            last_max_congestion_window: 0,
            acked_bytes_count: 0,
            estimated_tcp_congestion_window: 0,
            origin_point_congestion_window: 0,
            time_to_origin_point: 0,
            last_target_congestion_window: 0,
        }
    }

    pub fn reset(&mut self) {
        self.epoch = None;
        self.last_max_congestion_window = 0;
        self.acked_bytes_count = 0;
        self.estimated_tcp_congestion_window = 0;
        self.origin_point_congestion_window = 0;
        self.time_to_origin_point = 0;
        self.last_target_congestion_window = 0;
    }

    // Backoff factor for an ensemble of N Reno connections.
    fn beta(&self) -> f32 {
        let n = self.num_connections as f32;
        (n - 1. + BETA) / n
    }

    // TCP-friendly slope for the same ensemble: 3 N^2 (1-beta) / (1+beta).
    fn alpha(&self) -> f32 {
        let beta = self.beta();
        let n = self.num_connections as f32;
        3. * n * n * (1. - beta) / (1. + beta)
    }

    fn beta_last_max(&self) -> f32 {
        let n = self.num_connections as f32;
        (n - 1. + BETA_LAST_MAX) / n
    }

    pub fn set_num_connections(&mut self, n: u32) {
        self.num_connections = n;
    }

    /// Growth resumes from the current window on the next ack instead of
    /// continuing the old curve.
    pub fn on_application_limited(&mut self) {
        self.epoch = None;
    }

    pub fn congestion_window_after_packet_loss(&mut self, current_congestion_window: u64) -> u64 {
        if current_congestion_window + INITIAL_MAX_DATAGRAM_SIZE < self.last_max_congestion_window {
            self.last_max_congestion_window =
                (self.beta_last_max() * current_congestion_window as f32) as u64;
        } else {
            self.last_max_congestion_window = current_congestion_window;
        }
        self.epoch = None;
        (current_congestion_window as f32 * self.beta()) as u64
    }

    pub fn congestion_window_after_ack(
        &mut self,
        acked_bytes: u64,
        current_congestion_window: u64,
        delay_min: Duration,
        event_time: Instant,
    ) -> u64 {
        self.acked_bytes_count += acked_bytes;

        let epoch = match self.epoch {
            Some(epoch) => epoch,
            None => {
                // First ack of a new epoch: the curve's origin is either the
                // current window (we're past the old max) or the pre-loss max.
                self.acked_bytes_count = acked_bytes;
                self.estimated_tcp_congestion_window = current_congestion_window;
                if self.last_max_congestion_window <= current_congestion_window {
                    self.time_to_origin_point = 0;
                    self.origin_point_congestion_window = current_congestion_window;
                } else {
                    self.time_to_origin_point = ((CUBE_FACTOR
                        * (self.last_max_congestion_window - current_congestion_window))
                        as f64)
                        .cbrt() as u32;
                    self.origin_point_congestion_window = self.last_max_congestion_window;
                }
                self.epoch = Some(event_time);
                event_time
            }
        };

        let elapsed_time = (((event_time + delay_min)
            .saturating_duration_since(epoch)
            .as_micros() as u64)
            << 10)
            / 1_000_000;

        let offset = (self.time_to_origin_point as i64 - elapsed_time as i64).unsigned_abs();
        let delta = CUBE_CONGESTION_WINDOW_SCALE
            .saturating_mul(offset)
            .saturating_mul(offset)
            .saturating_mul(offset)
            .saturating_mul(INITIAL_MAX_DATAGRAM_SIZE)
            >> CUBE_SCALE;

        let mut target = if elapsed_time > self.time_to_origin_point as u64 {
            self.origin_point_congestion_window.saturating_add(delta)
        } else {
            self.origin_point_congestion_window.saturating_sub(delta)
        };
        // Concave-to-steady bound: never more than half the acked bytes ahead
        // of the current window.
        target = target.min(current_congestion_window + self.acked_bytes_count / 2);

        self.estimated_tcp_congestion_window += (self.acked_bytes_count as f32 * self.alpha()
            * INITIAL_MAX_DATAGRAM_SIZE as f32
            / self.estimated_tcp_congestion_window as f32)
            as u64;
        self.acked_bytes_count = 0;
        self.last_target_congestion_window = target;

        target.max(self.estimated_tcp_congestion_window)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use approx::assert_abs_diff_eq;
    use tracing::trace;

    use crate::test_util::setup_test_logging;

    use super::{Cubic, BETA, BETA_LAST_MAX};

    const MDS: u64 = super::INITIAL_MAX_DATAGRAM_SIZE;

    #[test]
    fn test_loss_reduces_by_beta() {
        let mut cubic = Cubic::new();
        let cwnd = 100 * MDS;
        let reduced = cubic.congestion_window_after_packet_loss(cwnd);
        assert_abs_diff_eq!(reduced as f32, cwnd as f32 * BETA, epsilon = 1.0);
        assert_eq!(cubic.last_max_congestion_window, cwnd);
    }

    #[test]
    fn test_loss_fast_convergence() {
        let mut cubic = Cubic::new();
        // Seed last-max high, then lose below it: last-max shrinks extra.
        cubic.congestion_window_after_packet_loss(100 * MDS);
        assert_eq!(cubic.last_max_congestion_window, 100 * MDS);

        let smaller = 50 * MDS;
        cubic.congestion_window_after_packet_loss(smaller);
        assert_abs_diff_eq!(
            cubic.last_max_congestion_window as f32,
            smaller as f32 * BETA_LAST_MAX,
            epsilon = 1.0
        );
    }

    #[test]
    fn test_first_ack_seeds_epoch_at_current_window() {
        let now = Instant::now();
        let mut cubic = Cubic::new();
        let cwnd = 10 * MDS;

        // No prior loss: the origin is the current window.
        cubic.congestion_window_after_ack(MDS, cwnd, Duration::from_millis(50), now);
        assert!(cubic.epoch.is_some());
        assert_eq!(cubic.origin_point_congestion_window, cwnd);
        assert_eq!(cubic.time_to_origin_point, 0);
    }

    #[test]
    fn test_first_ack_after_loss_targets_last_max() {
        let now = Instant::now();
        let mut cubic = Cubic::new();
        let cwnd = 100 * MDS;

        let reduced = cubic.congestion_window_after_packet_loss(cwnd);
        cubic.congestion_window_after_ack(MDS, reduced, Duration::from_millis(50), now);
        assert_eq!(cubic.origin_point_congestion_window, cwnd);
        assert!(cubic.time_to_origin_point > 0);
    }

    #[test]
    fn test_ack_growth_bounded_by_half_acked() {
        let now = Instant::now();
        let mut cubic = Cubic::new();
        let cwnd = 10 * MDS;

        let new = cubic.congestion_window_after_ack(MDS, cwnd, Duration::from_millis(50), now);
        assert!(
            new <= cwnd + MDS / 2,
            "single-ack growth exceeded half the acked bytes: {cwnd} -> {new}"
        );
        assert!(new >= cwnd);
    }

    #[test]
    fn test_application_limited_is_idempotent() {
        let now = Instant::now();
        let mut cubic = Cubic::new();
        let cwnd = 10 * MDS;

        cubic.congestion_window_after_ack(MDS, cwnd, Duration::from_millis(50), now);
        assert!(cubic.epoch.is_some());

        cubic.on_application_limited();
        assert!(cubic.epoch.is_none());
        cubic.on_application_limited();
        assert!(cubic.epoch.is_none());

        // Next ack re-seeds from the current window.
        cubic.congestion_window_after_ack(MDS, cwnd, Duration::from_millis(50), now);
        assert_eq!(cubic.origin_point_congestion_window, cwnd);
    }

    #[test]
    fn test_growth_playground() {
        setup_test_logging();
        let mut now = Instant::now();
        let rtt = Duration::from_millis(50);
        let mut cubic = Cubic::new();
        let mut cwnd = 32 * MDS;

        for _ in 0..50 {
            now += rtt;
            cwnd = cubic.congestion_window_after_ack(MDS, cwnd, rtt, now);
        }
        trace!(cwnd, "after 50 acks");

        let before_loss = cwnd;
        cwnd = cubic.congestion_window_after_packet_loss(cwnd);
        assert!(cwnd < before_loss);
        trace!(cwnd, "after loss");

        // The curve climbs back toward the pre-loss window.
        for _ in 0..500 {
            now += rtt;
            cwnd = cubic.congestion_window_after_ack(MDS, cwnd, rtt, now);
        }
        trace!(cwnd, "after recovery climb");
        assert!(cwnd >= before_loss);
    }
}
