use crate::config::ProbeKind;
use crate::types::{ProbeId, Sequence, TimeToLive};
use pinger_packet::icmpv4::timestamp::MS_PER_DAY;
use std::net::IpAddr;
use std::time::{Duration, SystemTime};

/// The number of payload bytes needed to embed a send timestamp.
pub const SEND_TIMESTAMP_SIZE: usize = 16;

/// A single outbound probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    /// The kind of probe.
    pub kind: ProbeKind,
    /// The echo identifier.
    pub identifier: ProbeId,
    /// The sequence number.
    pub sequence: Sequence,
    /// The time the probe was sent.
    pub sent: SystemTime,
}

impl Probe {
    #[must_use]
    pub const fn new(
        kind: ProbeKind,
        identifier: ProbeId,
        sequence: Sequence,
        sent: SystemTime,
    ) -> Self {
        Self {
            kind,
            identifier,
            sequence,
            sent,
        }
    }
}

/// A validated reply to a probe.
///
/// Valid for the duration of one receive call only, the engine consumes it
/// immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    /// The time the reply was received.
    pub recv: SystemTime,
    /// The host which sent the reply.
    ///
    /// This is the target for echo and timestamp replies and the reporting
    /// router for ICMP errors.
    pub addr: IpAddr,
    /// The sequence number of the probe being answered.
    pub sequence: Sequence,
    /// The time-to-live or hop-limit of the reply, when known.
    pub ttl: Option<TimeToLive>,
    /// The size of the ICMP message in bytes.
    pub bytes: usize,
    /// The send timestamp carried in the reply payload, when present.
    pub sent: Option<SystemTime>,
    /// The kind of reply.
    pub kind: ReplyKind,
}

/// The kind of reply received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// An ICMP echo reply.
    EchoReply,
    /// An ICMP timestamp reply (IPv4 only).
    TimestampReply(TimestampValues),
    /// A kernel or router reported ICMP error.
    IcmpError(IcmpError),
}

/// The timestamps carried by an ICMP timestamp reply.
///
/// All values are milliseconds since UTC midnight, wrapping at 86,400,000.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampValues {
    pub originate: u32,
    pub receive: u32,
    pub transmit: u32,
}

/// An ICMP error reported for a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpError {
    pub icmp_type: u8,
    pub icmp_code: u8,
}

/// Embed a send timestamp at the start of a probe payload.
///
/// A no-op when the payload is too small to hold one.
pub(crate) fn encode_send_timestamp(payload: &mut [u8], sent: SystemTime) {
    if payload.len() < SEND_TIMESTAMP_SIZE {
        return;
    }
    let elapsed = sent
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    payload[0..8].copy_from_slice(&elapsed.as_secs().to_be_bytes());
    payload[8..16].copy_from_slice(&u64::from(elapsed.subsec_nanos()).to_be_bytes());
}

/// Decode the send timestamp from a reply payload, if present and plausible.
pub(crate) fn decode_send_timestamp(payload: &[u8]) -> Option<SystemTime> {
    if payload.len() < SEND_TIMESTAMP_SIZE {
        return None;
    }
    let secs = u64::from_be_bytes(core::array::from_fn(|i| payload[i]));
    let nanos = u64::from_be_bytes(core::array::from_fn(|i| payload[i + 8]));
    if nanos >= 1_000_000_000 {
        return None;
    }
    SystemTime::UNIX_EPOCH.checked_add(Duration::new(secs, nanos as u32))
}

/// Milliseconds since UTC midnight, wrapping at one day.
pub(crate) fn ms_since_midnight(now: SystemTime) -> u32 {
    let elapsed = now
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    (elapsed.as_millis() % u128::from(MS_PER_DAY)) as u32
}

/// The wrapped difference between two since-midnight millisecond clocks.
pub(crate) const fn ms_elapsed_since(now_ms: u32, then_ms: u32) -> u32 {
    (now_ms.wrapping_sub(then_ms)).wrapping_add(MS_PER_DAY) % MS_PER_DAY
}
