use std::time::Duration;

use crate::constants::TIMER_GRANULARITY;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Bytes per second.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Bandwidth(u64);

impl Bandwidth {
    pub const fn from_bytes_per_second(bytes_per_second: u64) -> Self {
        Self(bytes_per_second)
    }

    /// Rate at which `window` bytes drain over one `rtt`. A zero RTT falls
    /// back to the timer granularity.
    pub fn from_window(window: u64, rtt: Duration) -> Self {
        let rtt = if rtt.is_zero() { TIMER_GRANULARITY } else { rtt };
        Self((window as u128 * NANOS_PER_SEC / rtt.as_nanos()) as u64)
    }

    pub const fn bytes_per_second(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Bytes transferred at this rate over `elapsed`.
    pub fn bytes_over(self, elapsed: Duration) -> u64 {
        (self.0 as u128 * elapsed.as_nanos() / NANOS_PER_SEC) as u64
    }

    /// Time to transfer `bytes` at this rate, rounded up.
    pub fn time_to_transfer(self, bytes: u64) -> Duration {
        if self.0 == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((bytes as u128 * NANOS_PER_SEC).div_ceil(self.0 as u128) as u64)
    }
}

impl std::fmt::Debug for Bandwidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} B/s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::constants::TIMER_GRANULARITY;

    use super::Bandwidth;

    #[test]
    fn test_from_window() {
        let bw = Bandwidth::from_window(50_000, Duration::from_millis(50));
        assert_eq!(bw.bytes_per_second(), 1_000_000);

        // No sample yet: pretend the window drains in one timer tick.
        let bw = Bandwidth::from_window(1000, Duration::ZERO);
        assert_eq!(
            bw,
            Bandwidth::from_window(1000, TIMER_GRANULARITY),
            "zero RTT must fall back to timer granularity"
        );
    }

    #[test]
    fn test_bytes_over() {
        let bw = Bandwidth::from_bytes_per_second(1_000_000);
        assert_eq!(bw.bytes_over(Duration::from_millis(3)), 3000);
        assert_eq!(bw.bytes_over(Duration::ZERO), 0);
    }

    #[test]
    fn test_time_to_transfer_rounds_up() {
        let bw = Bandwidth::from_bytes_per_second(1_000_000);
        assert_eq!(bw.time_to_transfer(1000), Duration::from_millis(1));
        assert_eq!(bw.time_to_transfer(1), Duration::from_micros(1));
        assert_eq!(
            Bandwidth::from_bytes_per_second(0).time_to_transfer(1000),
            Duration::ZERO
        );
    }
}
