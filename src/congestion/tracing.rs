use std::time::Instant;

use tracing::trace;

use crate::packet_number::PacketNumber;

use super::CongestionController;

/// Wraps a controller and trace-logs window changes, rate-limited so a busy
/// connection doesn't flood the log.
#[derive(Debug)]
pub struct TracingController<I> {
    inner: I,
}

impl<I> TracingController<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I: CongestionController> CongestionController for TracingController<I> {
    fn time_until_send(&self, now: Instant, bytes_in_flight: u64) -> Option<Instant> {
        self.inner.time_until_send(now, bytes_in_flight)
    }

    fn has_pacing_budget(&self, now: Instant) -> bool {
        self.inner.has_pacing_budget(now)
    }

    fn can_send(&self, bytes_in_flight: u64) -> bool {
        self.inner.can_send(bytes_in_flight)
    }

    fn window(&self) -> u64 {
        self.inner.window()
    }

    fn on_packet_sent(
        &mut self,
        now: Instant,
        bytes_in_flight: u64,
        packet_number: PacketNumber,
        bytes: u64,
        is_retransmittable: bool,
    ) {
        self.inner
            .on_packet_sent(now, bytes_in_flight, packet_number, bytes, is_retransmittable);
    }

    fn on_packet_acked(
        &mut self,
        packet_number: PacketNumber,
        acked_bytes: u64,
        prior_in_flight: u64,
        event_time: Instant,
    ) {
        log_every_ms_if_changed!(
            500,
            "on_packet_acked:cwnd",
            self,
            |s: &Self| s.inner.window(),
            |s: &mut Self| s
                .inner
                .on_packet_acked(packet_number, acked_bytes, prior_in_flight, event_time)
        )
    }

    fn on_congestion_event(
        &mut self,
        packet_number: PacketNumber,
        lost_bytes: u64,
        prior_in_flight: u64,
    ) {
        log_every_ms_if_changed!(
            500,
            "on_congestion_event:cwnd",
            self,
            |s: &Self| s.inner.window(),
            |s: &mut Self| s
                .inner
                .on_congestion_event(packet_number, lost_bytes, prior_in_flight)
        )
    }

    fn on_retransmission_timeout(&mut self, packets_retransmitted: bool) {
        log_every_ms_if_changed!(
            500,
            "on_retransmission_timeout:cwnd",
            self,
            |s: &Self| s.inner.window(),
            |s: &mut Self| s.inner.on_retransmission_timeout(packets_retransmitted)
        )
    }

    fn maybe_exit_slow_start(&mut self) {
        self.inner.maybe_exit_slow_start();
    }

    fn in_slow_start(&self) -> bool {
        self.inner.in_slow_start()
    }

    fn in_recovery(&self) -> bool {
        self.inner.in_recovery()
    }

    fn set_max_datagram_size(&mut self, bytes: u64) {
        trace!(bytes, "set_max_datagram_size");
        self.inner.set_max_datagram_size(bytes);
    }
}
