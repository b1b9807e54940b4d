use std::time::Duration;

use crate::packet_number::PacketNumber;

// Exit is only allowed once the window is at least this many packets.
const LOW_WINDOW: u64 = 16;
// RTT samples per round before the delay check fires.
const MIN_SAMPLES: u32 = 8;
// Delay increase that signals queue build-up: min RTT / 8, clamped to a
// small absolute range.
const DELAY_FACTOR_EXP: u32 = 3;
const DELAY_MIN_THRESHOLD: Duration = Duration::from_micros(4000);
const DELAY_MAX_THRESHOLD: Duration = Duration::from_micros(16000);

/// One round per slow-start window worth of packets: the round ends when a
/// packet sent after the round began is acked. Within a round the minimum
/// observed RTT is compared against the connection minimum.
#[derive(Debug, Default)]
pub struct HybridSlowStart {
    end_packet_number: Option<PacketNumber>,
    last_sent_packet_number: Option<PacketNumber>,
    started: bool,
    current_min_rtt: Duration,
    rtt_sample_count: u32,
    hystart_found: bool,
}

impl HybridSlowStart {
    fn start_receive_round(&mut self, last_sent: Option<PacketNumber>) {
        self.end_packet_number = last_sent;
        self.current_min_rtt = Duration::ZERO;
        self.rtt_sample_count = 0;
        self.started = true;
    }

    fn is_end_of_round(&self, ack: PacketNumber) -> bool {
        self.end_packet_number < Some(ack)
    }

    pub fn should_exit_slow_start(
        &mut self,
        latest_rtt: Duration,
        min_rtt: Duration,
        congestion_window_packets: u64,
    ) -> bool {
        if !self.started {
            self.start_receive_round(self.last_sent_packet_number);
        }
        if self.hystart_found {
            return true;
        }
        self.rtt_sample_count += 1;
        if self.rtt_sample_count <= MIN_SAMPLES
            && (self.current_min_rtt.is_zero() || self.current_min_rtt > latest_rtt)
        {
            self.current_min_rtt = latest_rtt;
        }
        if self.rtt_sample_count == MIN_SAMPLES {
            let threshold =
                (min_rtt / (1 << DELAY_FACTOR_EXP)).clamp(DELAY_MIN_THRESHOLD, DELAY_MAX_THRESHOLD);
            if self.current_min_rtt > min_rtt + threshold {
                self.hystart_found = true;
            }
        }
        congestion_window_packets >= LOW_WINDOW && self.hystart_found
    }

    pub fn on_packet_sent(&mut self, packet_number: PacketNumber) {
        self.last_sent_packet_number = Some(packet_number);
    }

    pub fn on_packet_acked(&mut self, acked_packet_number: PacketNumber) {
        if self.is_end_of_round(acked_packet_number) {
            self.started = false;
        }
    }

    pub fn restart(&mut self) {
        self.started = false;
        self.hystart_found = false;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::packet_number::PacketNumber;

    use super::HybridSlowStart;

    const MIN_RTT: Duration = Duration::from_millis(100);

    // min_rtt/8 = 12.5ms, so a round minimum above 112.5ms triggers exit.
    const RAISED_RTT: Duration = Duration::from_millis(115);

    fn feed_samples(hss: &mut HybridSlowStart, latest: Duration, n: u32) -> bool {
        let mut exit = false;
        for _ in 0..n {
            exit = hss.should_exit_slow_start(latest, MIN_RTT, 32);
        }
        exit
    }

    #[test]
    fn test_no_exit_at_min_rtt() {
        let mut hss = HybridSlowStart::default();
        hss.on_packet_sent(PacketNumber(10));
        assert!(!feed_samples(&mut hss, MIN_RTT, 10));
    }

    #[test]
    fn test_exit_when_round_min_rises() {
        let mut hss = HybridSlowStart::default();
        hss.on_packet_sent(PacketNumber(10));
        // The check fires on the 8th sample of the round.
        assert!(!feed_samples(&mut hss, RAISED_RTT, 7));
        assert!(feed_samples(&mut hss, RAISED_RTT, 1));
        // Sticky until restart.
        assert!(feed_samples(&mut hss, MIN_RTT, 1));
    }

    #[test]
    fn test_small_window_defers_exit() {
        let mut hss = HybridSlowStart::default();
        hss.on_packet_sent(PacketNumber(10));
        for _ in 0..8 {
            assert!(!hss.should_exit_slow_start(RAISED_RTT, MIN_RTT, 8));
        }
        // The delay was detected; a grown window lets it through.
        assert!(hss.should_exit_slow_start(RAISED_RTT, MIN_RTT, 16));
    }

    #[test]
    fn test_round_ends_at_recorded_packet() {
        let mut hss = HybridSlowStart::default();
        hss.on_packet_sent(PacketNumber(10));
        hss.should_exit_slow_start(MIN_RTT, MIN_RTT, 32);
        assert!(hss.started);

        // Acks up to the round end keep the round open.
        hss.on_packet_acked(PacketNumber(9));
        assert!(hss.started);
        hss.on_packet_acked(PacketNumber(10));
        assert!(hss.started);
        // An ack past the end closes it.
        hss.on_packet_acked(PacketNumber(11));
        assert!(!hss.started);
    }

    #[test]
    fn test_restart_clears_detection() {
        let mut hss = HybridSlowStart::default();
        hss.on_packet_sent(PacketNumber(10));
        assert!(feed_samples(&mut hss, RAISED_RTT, 8));
        hss.restart();
        assert!(!feed_samples(&mut hss, MIN_RTT, 8));
    }
}
