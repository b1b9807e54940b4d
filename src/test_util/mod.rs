use std::sync::Arc;

use parking_lot::Mutex;

use crate::recorder::{CongestionState, CongestionStateRecorder};

pub fn setup_test_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "trace");
    }
    let _ = tracing_subscriber::fmt::try_init();
}

/// Collects state transitions for assertions.
#[derive(Default, Clone)]
pub struct MockRecorder {
    states: Arc<Mutex<Vec<CongestionState>>>,
}

impl MockRecorder {
    pub fn states(&self) -> Vec<CongestionState> {
        self.states.lock().clone()
    }
}

impl CongestionStateRecorder for MockRecorder {
    fn record_congestion_state(&self, state: CongestionState) {
        self.states.lock().push(state);
    }
}
