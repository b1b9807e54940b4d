// TODO: plumb a per-connection override for LOSS_TOLERANCE_THRESHOLD; the
// cumulative gate makes every event congestive once a connection is past it.

use std::time::Duration;

// Reference datagram size the CUBIC curve's fixed-point factors are derived
// from. The curve does not track the sender's dynamic datagram size.
pub const INITIAL_MAX_DATAGRAM_SIZE: u64 = 1252;

pub const INITIAL_CONGESTION_WINDOW_PACKETS: u64 = 32;
pub const MAX_CONGESTION_WINDOW_PACKETS: u64 = 10_000;
pub const MIN_CONGESTION_WINDOW_PACKETS: u64 = 2;

// Upper bound on pacing debt, in packets.
pub const MAX_BURST_PACKETS: u64 = 3;

// User-space timer precision. Stands in for the RTT in bandwidth estimates
// before the first sample.
pub const TIMER_GRANULARITY: Duration = Duration::from_millis(1);

// Post-cutback window floor: keep enough in flight to sustain this rate
// (bits per second) at the current RTT.
pub const MIN_RATE_BITS_PER_SEC: u64 = 5 * 1024 * 1024;

// Smoothed-RTT stand-in for the floor above when there is no sample yet.
pub const MIN_RATE_FALLBACK_RTT: Duration = Duration::from_millis(100);

// Cumulative loss below this fraction of all bytes sent is treated as
// jitter, not congestion.
pub const LOSS_TOLERANCE_THRESHOLD: f64 = 0.10;
