use crate::config::{Config, IpTimestampFlavor, PrivilegeMode, ProbeKind};
use crate::error::Result;
use crate::pinger::Pinger;
use crate::types::{
    MaxProbes, PayloadPattern, PayloadSize, Preload, ProbeId, Sequence, TimeToLive, TypeOfService,
};
use std::net::IpAddr;
use std::time::Duration;

/// Build a [`Pinger`].
///
/// # Examples
///
/// Build a pinger which sends unprivileged echo probes with a 120 byte
/// payload every 500ms:
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// use pinger_core::{Builder, PayloadSize, PrivilegeMode};
/// use std::net::{IpAddr, Ipv4Addr};
/// use std::time::Duration;
///
/// let addr = IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1));
/// let pinger = Builder::new(addr)
///     .privilege_mode(PrivilegeMode::Unprivileged)
///     .payload_size(PayloadSize(120))
///     .interval(Duration::from_millis(500))
///     .build()?;
/// pinger.run()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Build a pinger for the given target address.
    #[must_use]
    pub fn new(target_addr: IpAddr) -> Self {
        Self {
            config: Config {
                target_addr,
                ..Default::default()
            },
        }
    }

    /// Set the source address to bind to.
    #[must_use]
    pub const fn source_addr(mut self, source_addr: Option<IpAddr>) -> Self {
        self.config.source_addr = source_addr;
        self
    }

    /// Set the privilege mode to request.
    #[must_use]
    pub const fn privilege_mode(mut self, privilege_mode: PrivilegeMode) -> Self {
        self.config.privilege_mode = privilege_mode;
        self
    }

    /// Set the kind of probe to send.
    #[must_use]
    pub const fn probe_kind(mut self, probe_kind: ProbeKind) -> Self {
        self.config.probe_kind = probe_kind;
        self
    }

    /// Set the echo identifier.
    #[must_use]
    pub const fn identifier(mut self, identifier: ProbeId) -> Self {
        self.config.identifier = identifier;
        self
    }

    /// Set the first sequence number.
    #[must_use]
    pub const fn initial_sequence(mut self, initial_sequence: Sequence) -> Self {
        self.config.initial_sequence = initial_sequence;
        self
    }

    /// Set the number of probes to send.
    #[must_use]
    pub const fn count(mut self, count: Option<MaxProbes>) -> Self {
        self.config.count = count;
        self
    }

    /// Set the delay between probes.
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Set the total time budget for the run.
    #[must_use]
    pub const fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set how long to wait for outstanding replies after the last send.
    #[must_use]
    pub const fn linger(mut self, linger: Duration) -> Self {
        self.config.linger = linger;
        self
    }

    /// Enable or disable flood mode.
    #[must_use]
    pub const fn flood(mut self, flood: bool) -> Self {
        self.config.flood = flood;
        self
    }

    /// Set the number of probes sent before the first wait.
    #[must_use]
    pub const fn preload(mut self, preload: Preload) -> Self {
        self.config.preload = preload;
        self
    }

    /// Set the number of ICMP data bytes per probe.
    #[must_use]
    pub const fn payload_size(mut self, payload_size: PayloadSize) -> Self {
        self.config.payload_size = payload_size;
        self
    }

    /// Set the byte used to fill the probe payload.
    #[must_use]
    pub const fn payload_pattern(mut self, payload_pattern: PayloadPattern) -> Self {
        self.config.payload_pattern = payload_pattern;
        self
    }

    /// Set the time-to-live or hop-limit for probes.
    #[must_use]
    pub const fn ttl(mut self, ttl: TimeToLive) -> Self {
        self.config.ttl = ttl;
        self
    }

    /// Set the type-of-service or traffic-class for probes.
    #[must_use]
    pub const fn tos(mut self, tos: TypeOfService) -> Self {
        self.config.tos = tos;
        self
    }

    /// Set how long a single readiness wait may block.
    #[must_use]
    pub const fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.config.read_timeout = read_timeout;
        self
    }

    /// Suppress per-reply events.
    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.config.quiet = quiet;
        self
    }

    /// Enable `SO_DEBUG` on the socket.
    #[must_use]
    pub const fn so_debug(mut self, so_debug: bool) -> Self {
        self.config.so_debug = so_debug;
        self
    }

    /// Enable `SO_DONTROUTE` on the socket.
    #[must_use]
    pub const fn dont_route(mut self, dont_route: bool) -> Self {
        self.config.dont_route = dont_route;
        self
    }

    /// Set `SO_LINGER` on the socket.
    #[must_use]
    pub const fn socket_linger(mut self, socket_linger: Option<Duration>) -> Self {
        self.config.socket_linger = socket_linger;
        self
    }

    /// Request the IPv4 record-route option.
    #[must_use]
    pub const fn record_route(mut self, record_route: bool) -> Self {
        self.config.record_route = record_route;
        self
    }

    /// Request the IPv4 timestamp option.
    #[must_use]
    pub const fn ip_timestamp(mut self, ip_timestamp: IpTimestampFlavor) -> Self {
        self.config.ip_timestamp = ip_timestamp;
        self
    }

    /// Validate the configuration and build the [`Pinger`].
    pub fn build(self) -> Result<Pinger> {
        Pinger::new(self.config)
    }
}
