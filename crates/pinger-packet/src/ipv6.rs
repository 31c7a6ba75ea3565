use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::{fmt_payload, IpProtocol};
use std::fmt::{Debug, Formatter};
use std::net::Ipv6Addr;

const VERSION_OFFSET: usize = 0;
const TRAFFIC_CLASS_OFFSET: usize = 0;
const FLOW_LABEL_OFFSET: usize = 1;
const PAYLOAD_LENGTH_OFFSET: usize = 4;
const NEXT_HEADER_OFFSET: usize = 6;
const HOP_LIMIT_OFFSET: usize = 7;
const SOURCE_ADDRESS_OFFSET: usize = 8;
const DESTINATION_ADDRESS_OFFSET: usize = 24;

/// Represents an IPv6 Packet.
///
/// The internal representation is held in network byte order (big-endian) and all accessor methods
/// take and return data in host byte order, converting as necessary for the given architecture.
pub struct Ipv6Packet<'a> {
    buf: Buffer<'a>,
}

impl<'a> Ipv6Packet<'a> {
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        if packet.len() >= Self::minimum_packet_size() {
            Ok(Self {
                buf: Buffer::Mutable(packet),
            })
        } else {
            Err(Error::InsufficientPacketBuffer(
                String::from("Ipv6Packet"),
                Self::minimum_packet_size(),
                packet.len(),
            ))
        }
    }

    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        if packet.len() >= Self::minimum_packet_size() {
            Ok(Self {
                buf: Buffer::Immutable(packet),
            })
        } else {
            Err(Error::InsufficientPacketBuffer(
                String::from("Ipv6Packet"),
                Self::minimum_packet_size(),
                packet.len(),
            ))
        }
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        40
    }

    #[must_use]
    pub fn get_version(&self) -> u8 {
        (self.buf.read(VERSION_OFFSET) & 0xf0) >> 4
    }

    #[must_use]
    pub fn get_traffic_class(&self) -> u8 {
        let b0 = ((self.buf.read(TRAFFIC_CLASS_OFFSET)) & 0xf) << 4;
        let b1 = ((self.buf.read(TRAFFIC_CLASS_OFFSET + 1)) & 0xf0) >> 4;
        b0 | b1
    }

    #[must_use]
    pub fn get_flow_label(&self) -> u32 {
        let b1 = (self.buf.read(FLOW_LABEL_OFFSET)) & 0xf;
        let b2 = self.buf.read(FLOW_LABEL_OFFSET + 1);
        let b3 = self.buf.read(FLOW_LABEL_OFFSET + 2);
        u32::from_be_bytes([0, b1, b2, b3])
    }

    #[must_use]
    pub fn get_payload_length(&self) -> u16 {
        u16::from_be_bytes(self.buf.get_bytes(PAYLOAD_LENGTH_OFFSET))
    }

    #[must_use]
    pub fn get_next_header(&self) -> IpProtocol {
        IpProtocol::from(self.buf.read(NEXT_HEADER_OFFSET))
    }

    #[must_use]
    pub fn get_hop_limit(&self) -> u8 {
        self.buf.read(HOP_LIMIT_OFFSET)
    }

    #[must_use]
    pub fn get_source_address(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.buf.get_bytes(SOURCE_ADDRESS_OFFSET))
    }

    #[must_use]
    pub fn get_destination_address(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.buf.get_bytes(DESTINATION_ADDRESS_OFFSET))
    }

    pub fn set_version(&mut self, val: u8) {
        *self.buf.write(VERSION_OFFSET) =
            (self.buf.read(VERSION_OFFSET) & 0xf) | ((val & 0xf) << 4);
    }

    pub fn set_traffic_class(&mut self, val: u8) {
        *self.buf.write(TRAFFIC_CLASS_OFFSET) =
            (self.buf.read(TRAFFIC_CLASS_OFFSET) & 0xf0) | ((val & 0xf0) >> 4);
        *self.buf.write(TRAFFIC_CLASS_OFFSET + 1) =
            (self.buf.read(TRAFFIC_CLASS_OFFSET + 1) & 0xf) | ((val & 0xf) << 4);
    }

    pub fn set_flow_label(&mut self, val: u32) {
        let bytes = val.to_be_bytes();
        *self.buf.write(FLOW_LABEL_OFFSET) = (self.buf.read(FLOW_LABEL_OFFSET) & 0xf0) | bytes[1];
        *self.buf.write(FLOW_LABEL_OFFSET + 1) = bytes[2];
        *self.buf.write(FLOW_LABEL_OFFSET + 2) = bytes[3];
    }

    pub fn set_payload_length(&mut self, val: u16) {
        self.buf.set_bytes(PAYLOAD_LENGTH_OFFSET, val.to_be_bytes());
    }

    pub fn set_next_header(&mut self, val: IpProtocol) {
        *self.buf.write(NEXT_HEADER_OFFSET) = val.id();
    }

    pub fn set_hop_limit(&mut self, val: u8) {
        *self.buf.write(HOP_LIMIT_OFFSET) = val;
    }

    pub fn set_source_address(&mut self, val: Ipv6Addr) {
        self.buf.set_bytes(SOURCE_ADDRESS_OFFSET, val.octets());
    }

    pub fn set_destination_address(&mut self, val: Ipv6Addr) {
        self.buf.set_bytes(DESTINATION_ADDRESS_OFFSET, val.octets());
    }

    pub fn set_payload(&mut self, vals: &[u8]) {
        let current_offset = Self::minimum_packet_size();
        debug_assert!(
            vals.len() <= self.get_payload_length() as usize,
            "vals.len() <= len"
        );
        self.buf.as_slice_mut()[current_offset..current_offset + vals.len()].copy_from_slice(vals);
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        self.buf.as_slice()
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        let start = Self::minimum_packet_size();
        let end = std::cmp::min(
            Self::minimum_packet_size() + self.get_payload_length() as usize,
            self.buf.as_slice().len(),
        );
        if self.buf.as_slice().len() <= start {
            return &[];
        }
        &self.buf.as_slice()[start..end]
    }
}

impl Debug for Ipv6Packet<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ipv6Packet")
            .field("version", &self.get_version())
            .field("traffic_class", &self.get_traffic_class())
            .field("flow_label", &self.get_flow_label())
            .field("payload_length", &self.get_payload_length())
            .field("next_header", &self.get_next_header())
            .field("hop_limit", &self.get_hop_limit())
            .field("source_address", &self.get_source_address())
            .field("destination_address", &self.get_destination_address())
            .field("payload", &fmt_payload(self.payload()))
            .finish()
    }
}

/// The result of walking the extension header chain.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ExtensionWalk {
    /// The protocol at which the walk stopped.
    pub protocol: IpProtocol,
    /// The total header size in bytes, fixed header included.
    ///
    /// This is the offset of the upper layer payload within the packet.
    pub header_size: usize,
}

/// Walk the extension header chain of a packet.
///
/// Hop-by-hop, routing and destination options headers occupy
/// `(ext_len + 1) * 8` bytes and must declare a non-zero `ext_len`, a
/// fragment header is a fixed 8 bytes and an authentication header
/// `(len + 2) * 4` bytes.  ESP and any unrecognized next-header value stop
/// the walk and the offset reached is the payload boundary.  A header that
/// declares a zero length or more bytes than the buffer holds fails the
/// whole walk.
pub fn walk_extension_headers(packet: &Ipv6Packet<'_>) -> Result<ExtensionWalk> {
    let buf = packet.packet();
    let mut protocol = packet.get_next_header();
    let mut offset = Ipv6Packet::minimum_packet_size();
    loop {
        let size = match protocol {
            IpProtocol::HopByHop | IpProtocol::Routing | IpProtocol::DestOpts => {
                let len = ext_len(buf, offset, protocol)?;
                if len == 0 {
                    return Err(Error::Malformed(
                        "Ipv6Packet",
                        format!(
                            "extension header {} at offset {offset} declares a zero length",
                            protocol.id()
                        ),
                    ));
                }
                (usize::from(len) + 1) * 8
            }
            IpProtocol::Fragment => {
                ext_len(buf, offset, protocol)?;
                8
            }
            IpProtocol::AuthHeader => (usize::from(ext_len(buf, offset, protocol)?) + 2) * 4,
            _ => {
                return Ok(ExtensionWalk {
                    protocol,
                    header_size: offset,
                })
            }
        };
        if offset + size > buf.len() {
            return Err(Error::Malformed(
                "Ipv6Packet",
                format!(
                    "extension header {} of {size} bytes at offset {offset} exceeds buffer length {}",
                    protocol.id(),
                    buf.len()
                ),
            ));
        }
        protocol = IpProtocol::from(buf[offset]);
        offset += size;
    }
}

// Every extension header starts with a next-header byte and a length byte.
fn ext_len(buf: &[u8], offset: usize, protocol: IpProtocol) -> Result<u8> {
    if offset + 2 > buf.len() {
        return Err(Error::Malformed(
            "Ipv6Packet",
            format!(
                "extension header {} at offset {offset} is truncated",
                protocol.id()
            ),
        ));
    }
    Ok(buf[offset + 1])
}
