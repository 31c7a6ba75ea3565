use crate::config::{Config, IpTimestampFlavor, PrivilegeMode};
use crate::error::{Error, ErrorKind, Result};
use crate::net::common::ErrorMapper;
use crate::net::ipv4::Ipv4;
use crate::net::ipv6::Ipv6;
use crate::net::socket::Socket;
use crate::net::Network;
use crate::probe::{Probe, Reply};
use std::io;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tracing::instrument;

/// The maximum size of any packet sent or received.
pub const MAX_PACKET_SIZE: usize = 1024;

/// The length of the `IPv4` record route option region.
const RECORD_ROUTE_OPTION_SIZE: usize = 39;

/// The length of the `IPv4` timestamp option region.
const IP_TIMESTAMP_OPTION_SIZE: usize = 40;

/// An ICMP channel over either the raw or the datagram socket tier.
///
/// The channel requests the raw tier when the configuration asks for
/// privileged mode and silently falls back to the datagram tier when the
/// raw socket is denied.  Options which require the raw tier are re-checked
/// against the tier actually obtained.
pub struct Channel<S: Socket> {
    socket: S,
    privilege_mode: PrivilegeMode,
    read_timeout: Duration,
    family: FamilyConfig,
}

impl<S: Socket> std::fmt::Debug for Channel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("privilege_mode", &self.privilege_mode)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

/// Address family specific probe strategy.
enum FamilyConfig {
    V4(Ipv4),
    V6(Ipv6),
}

impl<S: Socket> Channel<S> {
    /// Create a channel for the given configuration.
    #[instrument(skip_all, level = "trace")]
    pub fn connect(config: &Config) -> Result<Self> {
        tracing::debug!(?config);
        config.validate()?;
        let (mut socket, privilege_mode) = Self::connect_socket(config)?;
        config.validate_tier(privilege_mode)?;
        Self::configure(&mut socket, config, privilege_mode)?;
        let family = match config.target_addr {
            IpAddr::V4(dest_addr) => FamilyConfig::V4(Ipv4 {
                dest_addr,
                probe_kind: config.probe_kind,
                identifier: config.identifier,
                payload_size: config.payload_size,
                payload_pattern: config.payload_pattern,
                privilege_mode,
            }),
            IpAddr::V6(dest_addr) => FamilyConfig::V6(Ipv6 {
                src_addr: match config.source_addr {
                    Some(IpAddr::V6(addr)) => addr,
                    _ => Ipv6Addr::UNSPECIFIED,
                },
                dest_addr,
                identifier: config.identifier,
                payload_size: config.payload_size,
                payload_pattern: config.payload_pattern,
                privilege_mode,
            }),
        };
        Ok(Self {
            socket,
            privilege_mode,
            read_timeout: config.read_timeout,
            family,
        })
    }

    /// The socket tier actually obtained.
    #[must_use]
    pub const fn privilege_mode(&self) -> PrivilegeMode {
        self.privilege_mode
    }

    /// Create the ICMP socket, falling back to the datagram tier if needed.
    fn connect_socket(config: &Config) -> Result<(S, PrivilegeMode)> {
        let ipv4 = config.target_addr.is_ipv4();
        if config.privilege_mode == PrivilegeMode::Privileged {
            match Self::make_socket(ipv4, true) {
                Ok(socket) => return Ok((socket, PrivilegeMode::Privileged)),
                Err(Error::IoError(err))
                    if err.kind() == ErrorKind::Std(io::ErrorKind::PermissionDenied) =>
                {
                    tracing::debug!("raw socket denied, falling back to the datagram tier");
                }
                Err(err) => return Err(err),
            }
        }
        Ok((Self::make_socket(ipv4, false)?, PrivilegeMode::Unprivileged))
    }

    fn make_socket(ipv4: bool, raw: bool) -> Result<S> {
        Ok(if ipv4 {
            S::new_icmp_socket_ipv4(raw)?
        } else {
            S::new_icmp_socket_ipv6(raw)?
        })
    }

    fn configure(socket: &mut S, config: &Config, privilege_mode: PrivilegeMode) -> Result<()> {
        match config.target_addr {
            IpAddr::V4(_) => {
                socket.set_ttl(u32::from(config.ttl.0))?;
                socket.set_tos(u32::from(config.tos.0))?;
                socket.set_recv_ttl()?;
            }
            IpAddr::V6(_) => {
                socket.set_unicast_hops_v6(config.ttl.0)?;
                socket.set_tclass_v6(u32::from(config.tos.0))?;
                socket.set_recv_hop_limit()?;
            }
        }
        if config.so_debug {
            socket.set_socket_debug(true)?;
        }
        if config.dont_route {
            socket.set_dont_route(true)?;
        }
        if config.socket_linger.is_some() {
            socket.set_linger(config.socket_linger)?;
        }
        if let Some(source_addr) = config.source_addr {
            let addr = SocketAddr::new(source_addr, 0);
            socket
                .bind(addr)
                .map_err(Error::IoError)
                .map_err(|err| ErrorMapper::addr_in_use(err, addr))?;
        }
        if privilege_mode.is_unprivileged() {
            // the kernel filters replies and queues errors for us
            socket.connect(SocketAddr::new(config.target_addr, 0))?;
            match config.target_addr {
                IpAddr::V4(_) => socket.set_recv_err()?,
                IpAddr::V6(_) => socket.set_recv_err_v6()?,
            }
        } else if config.target_addr.is_ipv4() {
            if config.record_route {
                socket.set_ip_options(&record_route_options())?;
            }
            if config.ip_timestamp != IpTimestampFlavor::Disabled {
                socket.set_ip_options(&ip_timestamp_options(config.ip_timestamp))?;
            }
        }
        Ok(())
    }
}

impl<S: Socket> Network for Channel<S> {
    #[instrument(skip(self), level = "trace")]
    fn send_probe(&mut self, probe: Probe) -> Result<()> {
        match &self.family {
            FamilyConfig::V4(ipv4) => ipv4.dispatch_probe(&mut self.socket, probe),
            FamilyConfig::V6(ipv6) => ipv6.dispatch_probe(&mut self.socket, probe),
        }
    }

    #[instrument(skip(self), level = "trace")]
    fn recv_reply(&mut self) -> Result<Option<Reply>> {
        if self.privilege_mode.is_unprivileged() {
            let queued = match &self.family {
                FamilyConfig::V4(ipv4) => ipv4.recv_queued_error(&mut self.socket)?,
                FamilyConfig::V6(ipv6) => ipv6.recv_queued_error(&mut self.socket)?,
            };
            if queued.is_some() {
                return Ok(queued);
            }
        }
        if !self.socket.is_readable(self.read_timeout).map_err(Error::IoError)? {
            return Ok(None);
        }
        match &self.family {
            FamilyConfig::V4(ipv4) => ipv4.recv_reply(&mut self.socket),
            FamilyConfig::V6(ipv6) => ipv6.recv_reply(&mut self.socket),
        }
    }
}

/// The `IPv4` record route option region.
fn record_route_options() -> [u8; RECORD_ROUTE_OPTION_SIZE] {
    let mut options = [0_u8; RECORD_ROUTE_OPTION_SIZE];
    options[0] = 7;
    options[1] = RECORD_ROUTE_OPTION_SIZE as u8;
    options[2] = 4;
    options
}

/// The `IPv4` timestamp option region.
fn ip_timestamp_options(flavor: IpTimestampFlavor) -> [u8; IP_TIMESTAMP_OPTION_SIZE] {
    let mut options = [0_u8; IP_TIMESTAMP_OPTION_SIZE];
    options[0] = 68;
    options[1] = IP_TIMESTAMP_OPTION_SIZE as u8;
    options[2] = 5;
    options[3] = match flavor {
        IpTimestampFlavor::Disabled | IpTimestampFlavor::TimestampOnly => 0,
        IpTimestampFlavor::TimestampAndAddress => 1,
    };
    options
}
