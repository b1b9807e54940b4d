use std::sync::atomic::AtomicU64;

/// Connection-level byte counters, owned by the connection and shared with
/// the controller as eventually-consistent relaxed reads. The send path
/// bumps `bytes_sent`; the CUBIC loss path bumps the loss counters and reads
/// the ratio for its tolerance gate.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    pub bytes_sent: AtomicU64,
    pub bytes_lost: AtomicU64,
    pub packets_lost: AtomicU64,
}
