use derive_more::{Add, AddAssign};
use std::num::NonZeroUsize;

/// `Sequence` number newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd, Add, AddAssign)]
pub struct Sequence(pub u16);

impl Sequence {
    /// The sequence which follows this one, wrapping at `u16::MAX`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// `ProbeId` newtype.
///
/// The ICMP echo identifier used to correlate replies with this process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd)]
pub struct ProbeId(pub u16);

/// `MaxProbes` newtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd)]
pub struct MaxProbes(pub NonZeroUsize);

/// `Preload` newtype.
///
/// The number of probes sent back-to-back before the first wait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd)]
pub struct Preload(pub usize);

/// `TimeToLive` (ttl) newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd, Add, AddAssign)]
pub struct TimeToLive(pub u8);

/// `PayloadSize` newtype.
///
/// The number of ICMP data bytes carried by each probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd)]
pub struct PayloadSize(pub u16);

/// `PayloadPattern` newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd)]
pub struct PayloadPattern(pub u8);

/// `TypeOfService` (aka `DSCP` & `ECN`) newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd)]
pub struct TypeOfService(pub u8);

impl From<u16> for Sequence {
    fn from(val: u16) -> Self {
        Self(val)
    }
}

impl From<Sequence> for usize {
    fn from(sequence: Sequence) -> Self {
        sequence.0 as Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_next() {
        assert_eq!(Sequence(1), Sequence(0).next());
        assert_eq!(Sequence(0), Sequence(u16::MAX).next());
    }
}
