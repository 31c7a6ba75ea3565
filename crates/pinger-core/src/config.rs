use crate::error::{Error, Result};
use crate::types::{
    MaxProbes, PayloadPattern, PayloadSize, Preload, ProbeId, Sequence, TimeToLive, TypeOfService,
};
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Default values for configuration.
pub mod defaults {
    use crate::{PrivilegeMode, ProbeKind};
    use std::time::Duration;

    /// The default value for `privilege-mode`.
    pub const DEFAULT_PRIVILEGE_MODE: PrivilegeMode = PrivilegeMode::Privileged;

    /// The default value for `probe-kind`.
    pub const DEFAULT_PROBE_KIND: ProbeKind = ProbeKind::Echo;

    /// The default value for `interval`.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

    /// The inter-probe delay used in flood mode.
    pub const DEFAULT_FLOOD_INTERVAL: Duration = Duration::from_millis(10);

    /// The default value for `payload-size`.
    pub const DEFAULT_PAYLOAD_SIZE: u16 = 56;

    /// The default value for `payload-pattern`.
    pub const DEFAULT_PAYLOAD_PATTERN: u8 = 0;

    /// The default value for `ttl`.
    pub const DEFAULT_TTL: u8 = 64;

    /// The default value for `tos`.
    pub const DEFAULT_TOS: u8 = 0;

    /// The default value for `read-timeout`.
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

    /// The default value for `linger`.
    pub const DEFAULT_LINGER: Duration = Duration::from_millis(10_000);
}

/// The privilege mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PrivilegeMode {
    /// Privileged mode, using a raw ICMP socket.
    Privileged,
    /// Unprivileged mode, using a datagram ICMP socket.
    Unprivileged,
}

impl PrivilegeMode {
    #[must_use]
    pub const fn is_unprivileged(self) -> bool {
        match self {
            Self::Privileged => false,
            Self::Unprivileged => true,
        }
    }

    /// Discover the privilege mode supported by the current process.
    pub fn discover() -> Result<Self> {
        Ok(
            if pinger_privilege::Privilege::discover()?.has_privileges() {
                Self::Privileged
            } else {
                Self::Unprivileged
            },
        )
    }
}

impl Display for PrivilegeMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Privileged => write!(f, "privileged"),
            Self::Unprivileged => write!(f, "unprivileged"),
        }
    }
}

/// The kind of probe to send.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ProbeKind {
    /// ICMP echo request probes.
    Echo,
    /// ICMP timestamp request probes (IPv4 only).
    Timestamp,
}

impl Display for ProbeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Echo => write!(f, "echo"),
            Self::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// The IPv4 timestamp option flavor.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IpTimestampFlavor {
    /// Do not request IP timestamps.
    Disabled,
    /// Request timestamps only.
    TimestampOnly,
    /// Request timestamps and addresses.
    TimestampAndAddress,
}

impl Display for IpTimestampFlavor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::TimestampOnly => write!(f, "tsonly"),
            Self::TimestampAndAddress => write!(f, "tsaddr"),
        }
    }
}

/// Ping configuration.
///
/// Validated once by [`Config::validate`] before any socket is created.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    /// The address of the target host.
    pub target_addr: IpAddr,
    /// The source address to bind to, if any.
    pub source_addr: Option<IpAddr>,
    /// The privilege mode to request.
    pub privilege_mode: PrivilegeMode,
    /// The kind of probe to send.
    pub probe_kind: ProbeKind,
    /// The echo identifier for this process.
    pub identifier: ProbeId,
    /// The first sequence number to use.
    pub initial_sequence: Sequence,
    /// The number of probes to send, unbounded if `None`.
    pub count: Option<MaxProbes>,
    /// The delay between probes.
    pub interval: Duration,
    /// The total time budget for the run, unbounded if `None`.
    pub timeout: Option<Duration>,
    /// How long to wait for outstanding replies after the last send.
    pub linger: Duration,
    /// Whether to send probes as fast as the flood interval allows.
    pub flood: bool,
    /// The number of probes to send before the first wait.
    pub preload: Preload,
    /// The number of ICMP data bytes per probe.
    pub payload_size: PayloadSize,
    /// The byte used to fill the probe payload.
    pub payload_pattern: PayloadPattern,
    /// The time-to-live (IPv4) or hop-limit (IPv6) for probes.
    pub ttl: TimeToLive,
    /// The type-of-service (IPv4) or traffic-class (IPv6) for probes.
    pub tos: TypeOfService,
    /// How long a single readiness wait may block.
    pub read_timeout: Duration,
    /// Suppress per-reply events.
    pub quiet: bool,
    /// Enable `SO_DEBUG` on the socket.
    pub so_debug: bool,
    /// Enable `SO_DONTROUTE` on the socket.
    pub dont_route: bool,
    /// Set `SO_LINGER` on the socket, if any.
    pub socket_linger: Option<Duration>,
    /// Request the IPv4 record-route option (raw tier only).
    pub record_route: bool,
    /// Request the IPv4 timestamp option (raw tier only).
    pub ip_timestamp: IpTimestampFlavor,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            source_addr: None,
            privilege_mode: defaults::DEFAULT_PRIVILEGE_MODE,
            probe_kind: defaults::DEFAULT_PROBE_KIND,
            identifier: ProbeId((std::process::id() & 0xffff) as u16),
            initial_sequence: Sequence(0),
            count: None,
            interval: defaults::DEFAULT_INTERVAL,
            timeout: None,
            linger: defaults::DEFAULT_LINGER,
            flood: false,
            preload: Preload(0),
            payload_size: PayloadSize(defaults::DEFAULT_PAYLOAD_SIZE),
            payload_pattern: PayloadPattern(defaults::DEFAULT_PAYLOAD_PATTERN),
            ttl: TimeToLive(defaults::DEFAULT_TTL),
            tos: TypeOfService(defaults::DEFAULT_TOS),
            read_timeout: defaults::DEFAULT_READ_TIMEOUT,
            quiet: false,
            so_debug: false,
            dont_route: false,
            socket_linger: None,
            record_route: false,
            ip_timestamp: IpTimestampFlavor::Disabled,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// This is the policy gate evaluated before any socket is created.  Note
    /// that the privilege checks are re-evaluated against the actual tier via
    /// [`Config::validate_tier`] if the channel downgrades to the
    /// unprivileged tier.
    pub fn validate(&self) -> Result<()> {
        let payload_size = usize::from(self.payload_size.0);
        let packet_size =
            payload_size + pinger_packet::icmpv4::echo_request::EchoRequestPacket::minimum_packet_size();
        if packet_size > crate::net::MAX_PACKET_SIZE {
            return Err(Error::InvalidPacketSize(packet_size));
        }
        if let (Some(source), target) = (self.source_addr, self.target_addr) {
            if source.is_ipv4() != target.is_ipv4() {
                return Err(Error::BadConfig(format!(
                    "source address {source} and target address {target} must be the same family"
                )));
            }
        }
        if self.record_route && self.ip_timestamp != IpTimestampFlavor::Disabled {
            return Err(Error::BadConfig(String::from(
                "record-route and the IP timestamp option are mutually exclusive",
            )));
        }
        if self.target_addr.is_ipv6() {
            if self.probe_kind == ProbeKind::Timestamp {
                return Err(Error::BadConfig(String::from(
                    "timestamp probes are not supported for IPv6",
                )));
            }
            if self.record_route {
                return Err(Error::BadConfig(String::from(
                    "record-route is not supported for IPv6",
                )));
            }
            if self.ip_timestamp != IpTimestampFlavor::Disabled {
                return Err(Error::BadConfig(String::from(
                    "the IP timestamp option is not supported for IPv6",
                )));
            }
        }
        self.validate_tier(self.privilege_mode)
    }

    /// Reject option combinations which require the raw tier.
    pub fn validate_tier(&self, tier: PrivilegeMode) -> Result<()> {
        if tier.is_unprivileged() {
            if self.flood {
                return Err(Error::BadConfig(String::from(
                    "flood requires privileged mode",
                )));
            }
            if self.preload.0 > 0 {
                return Err(Error::BadConfig(String::from(
                    "preload requires privileged mode",
                )));
            }
            if self.record_route {
                return Err(Error::BadConfig(String::from(
                    "record-route requires privileged mode",
                )));
            }
            if self.ip_timestamp != IpTimestampFlavor::Disabled {
                return Err(Error::BadConfig(String::from(
                    "the IP timestamp option requires privileged mode",
                )));
            }
        }
        Ok(())
    }
}
