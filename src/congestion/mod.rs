pub mod cubic;
pub mod cubic_sender;
pub mod hybrid_slow_start;
pub mod hysteria;
pub mod pacer;
pub mod tracing;

use std::{str::FromStr, sync::Arc, time::Instant};

use crate::{
    constants::INITIAL_MAX_DATAGRAM_SIZE, error::Error, packet_number::PacketNumber,
    recorder::CongestionStateRecorder, rtt::RttStats, stats::ConnectionStats,
};

/// Decides how many bytes may be in flight and when the next packet may
/// leave the host. Owned by exactly one send loop; every method is plain
/// arithmetic over in-memory state and returns promptly.
pub trait CongestionController: Send + core::fmt::Debug {
    /// Earliest instant at which the caller may send. `None` means
    /// immediately; an instant far in the future means sending is blocked
    /// on acks.
    fn time_until_send(&self, now: Instant, bytes_in_flight: u64) -> Option<Instant>;

    /// True iff a full max-size datagram fits in the current pacing budget.
    fn has_pacing_budget(&self, now: Instant) -> bool;

    fn can_send(&self, bytes_in_flight: u64) -> bool;

    /// Congestion window in bytes.
    fn window(&self) -> u64;

    fn on_packet_sent(
        &mut self,
        now: Instant,
        bytes_in_flight: u64,
        packet_number: PacketNumber,
        bytes: u64,
        is_retransmittable: bool,
    );

    fn on_packet_acked(
        &mut self,
        packet_number: PacketNumber,
        acked_bytes: u64,
        prior_in_flight: u64,
        event_time: Instant,
    );

    /// The loss detector declared packets lost.
    fn on_congestion_event(&mut self, packet_number: PacketNumber, lost_bytes: u64, prior_in_flight: u64);

    fn on_retransmission_timeout(&mut self, packets_retransmitted: bool);

    fn maybe_exit_slow_start(&mut self);

    fn in_slow_start(&self) -> bool;

    fn in_recovery(&self) -> bool;

    /// Set the maximum datagram size. The new size must not be smaller than
    /// the current one.
    fn set_max_datagram_size(&mut self, bytes: u64);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CongestionControlKind {
    Reno,
    #[default]
    Cubic,
    Hysteria,
}

impl FromStr for CongestionControlKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "reno" => Ok(CongestionControlKind::Reno),
            "cubic" => Ok(CongestionControlKind::Cubic),
            "hysteria" => Ok(CongestionControlKind::Hysteria),
            other => Err(Error::UnknownCongestionControl(other.to_owned())),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CongestionConfig {
    pub kind: CongestionControlKind,
    // Hysteria's target rate. Zero or negative means 10 Mbps.
    pub max_bandwidth_mbps: i64,
    pub tracing: bool,
}

impl CongestionConfig {
    pub fn create(
        &self,
        now: Instant,
        rtt_stats: Arc<RttStats>,
        conn_stats: Arc<ConnectionStats>,
        recorder: Option<Box<dyn CongestionStateRecorder>>,
    ) -> Box<dyn CongestionController> {
        use self::cubic_sender::CubicSender;
        use self::hysteria::HysteriaSender;
        use self::tracing::TracingController;

        if let CongestionControlKind::Hysteria = self.kind {
            let sender = HysteriaSender::new(
                now,
                rtt_stats,
                INITIAL_MAX_DATAGRAM_SIZE,
                self.max_bandwidth_mbps,
            );
            return if self.tracing {
                Box::new(TracingController::new(sender))
            } else {
                Box::new(sender)
            };
        }

        let reno = self.kind == CongestionControlKind::Reno;
        let sender = CubicSender::new(
            now,
            rtt_stats,
            conn_stats,
            INITIAL_MAX_DATAGRAM_SIZE,
            reno,
            recorder,
        );
        if self.tracing {
            Box::new(TracingController::new(sender))
        } else {
            Box::new(sender)
        }
    }
}
