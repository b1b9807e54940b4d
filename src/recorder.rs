/// Congestion phases reported to the observability sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CongestionState {
    SlowStart,
    CongestionAvoidance,
    Recovery,
    ApplicationLimited,
}

impl std::fmt::Display for CongestionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CongestionState::SlowStart => "slow-start",
            CongestionState::CongestionAvoidance => "congestion-avoidance",
            CongestionState::Recovery => "recovery",
            CongestionState::ApplicationLimited => "application-limited",
        };
        f.write_str(s)
    }
}

/// Write-only sink for congestion state transitions.
///
/// Tests use a mock recorder.
pub trait CongestionStateRecorder: Send + Sync {
    fn record_congestion_state(&self, state: CongestionState);
}
