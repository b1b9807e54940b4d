#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unknown congestion control algorithm {0:?}, expected \"cubic\", \"reno\" or \"hysteria\"")]
    UnknownCongestionControl(String),
}

pub type Result<T> = std::result::Result<T, Error>;
