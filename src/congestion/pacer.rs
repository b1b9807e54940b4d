use std::time::Instant;

use crate::{bandwidth::Bandwidth, constants::MAX_BURST_PACKETS};

/// Leaky bucket smoothing sends to the bandwidth estimate. The rate source
/// is owned by the enclosing sender and passed into every call.
#[derive(Debug)]
pub struct Pacer {
    budget_at_last_sent: u64,
    max_datagram_size: u64,
    last_sent: Instant,
}

impl Pacer {
    pub fn new(now: Instant, max_datagram_size: u64) -> Self {
        Self {
            budget_at_last_sent: MAX_BURST_PACKETS * max_datagram_size,
            max_datagram_size,
            last_sent: now,
        }
    }

    fn max_burst_size(&self) -> u64 {
        MAX_BURST_PACKETS * self.max_datagram_size
    }

    /// Sendable bytes at `now`: the budget at the last send plus whatever
    /// refilled since, capped at the burst size.
    pub fn budget(&self, now: Instant, bandwidth: Bandwidth) -> u64 {
        let elapsed = now.saturating_duration_since(self.last_sent);
        self.max_burst_size().min(
            self.budget_at_last_sent
                .saturating_add(bandwidth.bytes_over(elapsed)),
        )
    }

    /// `None` when a full datagram fits the budget at `now`; otherwise the
    /// instant the bucket refills to one datagram.
    pub fn time_until_send(&self, now: Instant, bandwidth: Bandwidth) -> Option<Instant> {
        if bandwidth.is_zero() {
            return None;
        }
        if self.budget(now, bandwidth) >= self.max_datagram_size {
            return None;
        }
        Some(
            self.last_sent
                + bandwidth.time_to_transfer(self.max_datagram_size - self.budget_at_last_sent),
        )
    }

    pub fn sent_packet(&mut self, now: Instant, bandwidth: Bandwidth, bytes: u64) {
        self.budget_at_last_sent = self.budget(now, bandwidth).saturating_sub(bytes);
        self.last_sent = now;
    }

    pub fn set_max_datagram_size(&mut self, max_datagram_size: u64) {
        self.max_datagram_size = max_datagram_size;
    }
}
