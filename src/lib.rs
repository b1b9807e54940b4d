// TODO: BBR-style bandwidth sampling as a third controller
//
// TODO: wire ECN-CE marks into on_congestion_event once the loss detector
// classifies them

#[macro_use]
mod macros;

pub mod bandwidth;
pub mod congestion;
mod constants;
pub mod error;
mod metrics;
pub mod packet_number;
pub mod recorder;
pub mod rtt;
pub mod stats;
#[cfg(test)]
pub mod test_util;

pub use bandwidth::Bandwidth;
pub use congestion::{CongestionConfig, CongestionControlKind, CongestionController};
pub use error::{Error, Result};
pub use packet_number::PacketNumber;
pub use recorder::{CongestionState, CongestionStateRecorder};
pub use rtt::RttStats;
pub use stats::ConnectionStats;
