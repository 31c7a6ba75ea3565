use crate::error::IoResult as Result;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// The operations required of a ping socket.
///
/// The `raw` flag on the constructors selects between the raw and datagram
/// ICMP socket types, the caller decides which tier to use.
#[cfg_attr(test, mockall::automock)]
pub trait Socket
where
    Self: Sized,
{
    /// Create an IPv4 socket for sending and receiving ICMP.
    fn new_icmp_socket_ipv4(raw: bool) -> Result<Self>;
    /// Create an IPv6 socket for sending and receiving ICMP.
    fn new_icmp_socket_ipv6(raw: bool) -> Result<Self>;
    fn bind(&mut self, address: SocketAddr) -> Result<()>;
    fn connect(&mut self, address: SocketAddr) -> Result<()>;
    fn set_ttl(&mut self, ttl: u32) -> Result<()>;
    fn set_unicast_hops_v6(&mut self, hops: u8) -> Result<()>;
    fn set_tos(&mut self, tos: u32) -> Result<()>;
    fn set_tclass_v6(&mut self, tclass: u32) -> Result<()>;
    fn set_socket_debug(&mut self, enabled: bool) -> Result<()>;
    fn set_dont_route(&mut self, enabled: bool) -> Result<()>;
    fn set_linger(&mut self, linger: Option<Duration>) -> Result<()>;
    /// Request the TTL of each received datagram as ancillary data.
    fn set_recv_ttl(&mut self) -> Result<()>;
    /// Request the hop limit of each received datagram as ancillary data.
    fn set_recv_hop_limit(&mut self) -> Result<()>;
    /// Enable kernel ICMP error delivery via the error queue.
    fn set_recv_err(&mut self) -> Result<()>;
    /// Enable kernel ICMPv6 error delivery via the error queue.
    fn set_recv_err_v6(&mut self) -> Result<()>;
    /// Set raw IPv4 header options such as record-route.
    fn set_ip_options(&mut self, options: &[u8]) -> Result<()>;
    fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> Result<()>;
    /// Returns true if the socket becomes readable before the timeout, false otherwise.
    fn is_readable(&mut self, timeout: Duration) -> Result<bool>;
    /// Receive one datagram along with its ancillary metadata.
    fn recv_msg(&mut self, buf: &mut [u8]) -> Result<RecvMeta>;
    /// Drain one queued kernel ICMP error, if any.
    fn recv_queued_error(&mut self, buf: &mut [u8]) -> Result<Option<QueuedError>>;
}

/// Metadata for one received datagram.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RecvMeta {
    /// The number of bytes received.
    pub bytes: usize,
    /// The source of the datagram, when known.
    pub addr: Option<IpAddr>,
    /// The TTL or hop limit from ancillary data, when delivered.
    pub ttl: Option<u8>,
}

/// A kernel ICMP error drained from the socket error queue.
///
/// The receive buffer holds the payload of the original outbound probe.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct QueuedError {
    /// The number of payload bytes placed in the receive buffer.
    pub bytes: usize,
    /// The host which generated the error, when known.
    pub offender: Option<IpAddr>,
    /// The ICMP type of the error.
    pub icmp_type: u8,
    /// The ICMP code of the error.
    pub icmp_code: u8,
}
