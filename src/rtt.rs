use std::{
    sync::atomic::{AtomicU64, Ordering::Relaxed},
    time::Duration,
};

// rfc6298: SRTT <- (1 - alpha) * SRTT + alpha * R', alpha = 1/8
//          RTTVAR <- (1 - beta) * RTTVAR + beta * |SRTT - R'|, beta = 1/4

/// RTT oracle shared between the estimator owner and the congestion
/// controllers. Durations are stored as relaxed atomic nanoseconds so
/// readers never take a lock; zero means "no sample yet".
#[derive(Debug, Default)]
pub struct RttStats {
    latest_ns: AtomicU64,
    smoothed_ns: AtomicU64,
    var_ns: AtomicU64,
    min_ns: AtomicU64,
}

impl RttStats {
    pub fn on_sample(&self, rtt: Duration) {
        if rtt.is_zero() {
            return;
        }
        let rtt_ns = rtt.as_nanos() as u64;
        self.latest_ns.store(rtt_ns, Relaxed);

        let smoothed = self.smoothed_ns.load(Relaxed);
        if smoothed == 0 {
            self.smoothed_ns.store(rtt_ns, Relaxed);
            self.var_ns.store(rtt_ns / 2, Relaxed);
            self.min_ns.store(rtt_ns, Relaxed);
        } else {
            let var = self.var_ns.load(Relaxed);
            self.var_ns
                .store(var * 3 / 4 + smoothed.abs_diff(rtt_ns) / 4, Relaxed);
            self.smoothed_ns.store((smoothed * 7 + rtt_ns) / 8, Relaxed);
            if rtt_ns < self.min_ns.load(Relaxed) {
                self.min_ns.store(rtt_ns, Relaxed);
            }
        }
    }

    pub fn latest_rtt(&self) -> Duration {
        Duration::from_nanos(self.latest_ns.load(Relaxed))
    }

    pub fn smoothed_rtt(&self) -> Duration {
        Duration::from_nanos(self.smoothed_ns.load(Relaxed))
    }

    pub fn min_rtt(&self) -> Duration {
        Duration::from_nanos(self.min_ns.load(Relaxed))
    }

    #[cfg(test)]
    pub fn set_for_test(&self, latest: Duration, smoothed: Duration, min: Duration) {
        self.latest_ns.store(latest.as_nanos() as u64, Relaxed);
        self.smoothed_ns.store(smoothed.as_nanos() as u64, Relaxed);
        self.min_ns.store(min.as_nanos() as u64, Relaxed);
    }
}
