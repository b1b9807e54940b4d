use std::ops::Deref;

// Packet numbers only ever increase, so no wrapping arithmetic. "No packet
// yet" is `Option<PacketNumber>::None`, which sorts below every valid number.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default, Hash)]
pub struct PacketNumber(pub u64);

impl Deref for PacketNumber {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u64> for PacketNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for PacketNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Debug for PacketNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
