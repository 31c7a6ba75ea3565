//! Packet wire format parsing and building for a ping probe engine.
//!
//! The following packets are supported:
//! - `ICMPv4` (echo and timestamp messages)
//! - `ICMPv6` (echo messages)
//! - `IPv4` (including header options)
//! - `IPv6` (including the extension header chain)
//!
//! # Endianness
//!
//! The internal representation is held in network byte order (big-endian) and
//! all accessor methods take and return data in host byte order, converting as
//! necessary for the given architecture.
//!
//! # Example
//!
//! The following example builds an `ICMPv4` echo request packet:
//!
//! ```rust
//! # fn main() -> anyhow::Result<()> {
//! use pinger_packet::checksum::icmp_ipv4_checksum;
//! use pinger_packet::icmpv4::echo_request::EchoRequestPacket;
//! use pinger_packet::icmpv4::{IcmpCode, IcmpType};
//!
//! let mut buf = [0_u8; 8];
//! let mut icmp = EchoRequestPacket::new(&mut buf)?;
//! icmp.set_icmp_type(IcmpType::EchoRequest);
//! icmp.set_icmp_code(IcmpCode(0));
//! icmp.set_identifier(1234);
//! icmp.set_sequence(10);
//! icmp.set_checksum(icmp_ipv4_checksum(icmp.packet()));
//! assert_eq!(icmp.packet(), &hex_literal::hex!("08 00 f3 23 04 d2 00 0a"));
//! # Ok(())
//! # }
//! ```
//!
//! The following example parses an `IPv4` header and asserts its fields:
//!
//! ```rust
//! # fn main() -> anyhow::Result<()> {
//! use pinger_packet::ipv4::Ipv4Packet;
//! use pinger_packet::IpProtocol;
//!
//! let buf = hex_literal::hex!(
//!     "45 00 00 54 a2 71 00 00 36 01 10 4f 8e fa 42 2e c0 a8 01 c9"
//! );
//! let packet = Ipv4Packet::new_view(&buf)?;
//! assert_eq!(5, packet.get_header_length());
//! assert_eq!(54, packet.get_ttl());
//! assert_eq!(IpProtocol::Icmp, packet.get_protocol());
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod buffer;

/// Packet errors.
pub mod error;

/// Functions for calculating network checksums.
pub mod checksum;

/// `ICMPv4` packets.
pub mod icmpv4;

/// `ICMPv6` packets.
pub mod icmpv6;

/// `IPv4` packets.
pub mod ipv4;

/// `IPv6` packets.
pub mod ipv6;

/// The IP packet next layer protocol.
///
/// The `IPv6` extension header types are modelled here as the extension
/// header chain is walked via the same next-header field that names the
/// upper-layer protocol.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IpProtocol {
    Icmp,
    IcmpV6,
    HopByHop,
    Routing,
    Fragment,
    Esp,
    AuthHeader,
    DestOpts,
    Other(u8),
}

impl IpProtocol {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::HopByHop => 0,
            Self::Icmp => 1,
            Self::Routing => 43,
            Self::Fragment => 44,
            Self::Esp => 50,
            Self::AuthHeader => 51,
            Self::IcmpV6 => 58,
            Self::DestOpts => 60,
            Self::Other(id) => id,
        }
    }

    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self::Other(value)
    }
}

impl From<u8> for IpProtocol {
    fn from(id: u8) -> Self {
        match id {
            0 => Self::HopByHop,
            1 => Self::Icmp,
            43 => Self::Routing,
            44 => Self::Fragment,
            50 => Self::Esp,
            51 => Self::AuthHeader,
            58 => Self::IcmpV6,
            60 => Self::DestOpts,
            p => Self::Other(p),
        }
    }
}

/// Format a payload as a hexadecimal string.
#[must_use]
pub fn fmt_payload(bytes: &[u8]) -> String {
    use itertools::Itertools as _;
    format!("{:02x}", bytes.iter().format(" "))
}
