use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::{fmt_payload, IpProtocol};
use std::fmt::{Debug, Formatter};
use std::net::Ipv4Addr;

const VERSION_OFFSET: usize = 0;
const IHL_OFFSET: usize = 0;
const DSCP_OFFSET: usize = 1;
const ECN_OFFSET: usize = 1;
const TOTAL_LENGTH_OFFSET: usize = 2;
const IDENTIFICATION_OFFSET: usize = 4;
const FLAGS_AND_FRAGMENT_OFFSET_OFFSET: usize = 6;
const TIME_TO_LIVE_OFFSET: usize = 8;
const PROTOCOL_OFFSET: usize = 9;
const CHECKSUM_OFFSET: usize = 10;
const SOURCE_OFFSET: usize = 12;
const DESTINATION_OFFSET: usize = 16;

/// The maximum number of options retained from a single header.
pub const MAX_OPTIONS: usize = 10;

/// Represents an IPv4 Packet.
///
/// The internal representation is held in network byte order (big-endian) and all accessor methods
/// take and return data in host byte order, converting as necessary for the given architecture.
pub struct Ipv4Packet<'a> {
    buf: Buffer<'a>,
}

impl<'a> Ipv4Packet<'a> {
    pub fn new(packet: &'a mut [u8]) -> Result<Self> {
        if packet.len() >= Self::minimum_packet_size() {
            Ok(Self {
                buf: Buffer::Mutable(packet),
            })
        } else {
            Err(Error::InsufficientPacketBuffer(
                String::from("Ipv4Packet"),
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
                String::from("Ipv4Packet"),
                Self::minimum_packet_size(),
                packet.len(),
            ))
        }
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        20
    }

    #[must_use]
    pub fn get_version(&self) -> u8 {
        (self.buf.read(VERSION_OFFSET) & 0xf0) >> 4
    }

    #[must_use]
    pub fn get_header_length(&self) -> u8 {
        self.buf.read(IHL_OFFSET) & 0xf
    }

    /// The header length in bytes, validated against the buffer.
    ///
    /// Fails if the header length field declares fewer than 5 words or more
    /// bytes than the buffer holds.
    pub fn checked_header_size(&self) -> Result<usize> {
        let ihl = usize::from(self.get_header_length());
        if ihl < 5 {
            return Err(Error::Malformed(
                "Ipv4Packet",
                format!("header length {ihl} words is below the minimum of 5"),
            ));
        }
        let size = ihl * 4;
        if size > self.buf.as_slice().len() {
            return Err(Error::Malformed(
                "Ipv4Packet",
                format!(
                    "header length {size} exceeds buffer length {}",
                    self.buf.as_slice().len()
                ),
            ));
        }
        Ok(size)
    }

    #[must_use]
    pub fn get_dscp(&self) -> u8 {
        (self.buf.read(DSCP_OFFSET) & 0xfc) >> 2
    }

    #[must_use]
    pub fn get_ecn(&self) -> u8 {
        self.buf.read(ECN_OFFSET) & 0x3
    }

    #[must_use]
    pub fn get_tos(&self) -> u8 {
        (self.get_dscp() << 2) | self.get_ecn()
    }

    #[must_use]
    pub fn get_total_length(&self) -> u16 {
        u16::from_be_bytes(self.buf.get_bytes(TOTAL_LENGTH_OFFSET))
    }

    #[must_use]
    pub fn get_identification(&self) -> u16 {
        u16::from_be_bytes(self.buf.get_bytes(IDENTIFICATION_OFFSET))
    }

    #[must_use]
    pub fn get_flags_and_fragment_offset(&self) -> u16 {
        u16::from_be_bytes(self.buf.get_bytes(FLAGS_AND_FRAGMENT_OFFSET_OFFSET))
    }

    #[must_use]
    pub fn get_dont_fragment(&self) -> bool {
        self.get_flags_and_fragment_offset() & 0x4000 != 0
    }

    #[must_use]
    pub fn get_more_fragments(&self) -> bool {
        self.get_flags_and_fragment_offset() & 0x2000 != 0
    }

    #[must_use]
    pub fn get_fragment_offset(&self) -> u16 {
        self.get_flags_and_fragment_offset() & 0x1fff
    }

    #[must_use]
    pub fn get_ttl(&self) -> u8 {
        self.buf.read(TIME_TO_LIVE_OFFSET)
    }

    #[must_use]
    pub fn get_protocol(&self) -> IpProtocol {
        IpProtocol::from(self.buf.read(PROTOCOL_OFFSET))
    }

    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        u16::from_be_bytes(self.buf.get_bytes(CHECKSUM_OFFSET))
    }

    #[must_use]
    pub fn get_source(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.buf.get_bytes(SOURCE_OFFSET))
    }

    #[must_use]
    pub fn get_destination(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.buf.get_bytes(DESTINATION_OFFSET))
    }

    #[must_use]
    pub fn get_options_raw(&self) -> &[u8] {
        let current_offset = Self::minimum_packet_size();
        let end = std::cmp::min(
            current_offset + ipv4_options_length(self),
            self.buf.as_slice().len(),
        );
        &self.buf.as_slice()[current_offset..end]
    }

    /// Decode the options region of the header.
    pub fn options(&self) -> Result<Vec<Ipv4Option>> {
        parse_options(self.get_options_raw())
    }

    pub fn set_version(&mut self, val: u8) {
        *self.buf.write(VERSION_OFFSET) =
            (self.buf.read(VERSION_OFFSET) & 0xf) | ((val & 0xf) << 4);
    }

    pub fn set_header_length(&mut self, val: u8) {
        *self.buf.write(IHL_OFFSET) = (self.buf.read(IHL_OFFSET) & 0xf0) | (val & 0xf);
    }

    pub fn set_dscp(&mut self, val: u8) {
        *self.buf.write(DSCP_OFFSET) = (self.buf.read(DSCP_OFFSET) & 0x3) | ((val & 0x3f) << 2);
    }

    pub fn set_ecn(&mut self, val: u8) {
        *self.buf.write(ECN_OFFSET) = (self.buf.read(ECN_OFFSET) & 0xfc) | (val & 0x3);
    }

    pub fn set_tos(&mut self, val: u8) {
        self.set_dscp((val & 0xfc) >> 2);
        self.set_ecn(val & 0x3);
    }

    pub fn set_total_length(&mut self, val: u16) {
        self.buf.set_bytes(TOTAL_LENGTH_OFFSET, val.to_be_bytes());
    }

    pub fn set_identification(&mut self, val: u16) {
        self.buf.set_bytes(IDENTIFICATION_OFFSET, val.to_be_bytes());
    }

    pub fn set_flags_and_fragment_offset(&mut self, val: u16) {
        self.buf
            .set_bytes(FLAGS_AND_FRAGMENT_OFFSET_OFFSET, val.to_be_bytes());
    }

    pub fn set_ttl(&mut self, val: u8) {
        *self.buf.write(TIME_TO_LIVE_OFFSET) = val;
    }

    pub fn set_protocol(&mut self, val: IpProtocol) {
        *self.buf.write(PROTOCOL_OFFSET) = val.id();
    }

    pub fn set_checksum(&mut self, val: u16) {
        self.buf.set_bytes(CHECKSUM_OFFSET, val.to_be_bytes());
    }

    pub fn set_source(&mut self, val: Ipv4Addr) {
        self.buf.set_bytes(SOURCE_OFFSET, val.octets());
    }

    pub fn set_destination(&mut self, val: Ipv4Addr) {
        self.buf.set_bytes(DESTINATION_OFFSET, val.octets());
    }

    pub fn set_payload(&mut self, vals: &[u8]) {
        let current_offset = Self::minimum_packet_size() + ipv4_options_length(self);
        self.buf.as_slice_mut()[current_offset..current_offset + vals.len()].copy_from_slice(vals);
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        self.buf.as_slice()
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        let start = Ipv4Packet::minimum_packet_size() + ipv4_options_length(self);
        &self.buf.as_slice()[start..]
    }
}

fn ipv4_options_length(ipv4: &Ipv4Packet<'_>) -> usize {
    (ipv4.get_header_length() as usize * 4).saturating_sub(Ipv4Packet::minimum_packet_size())
}

impl Debug for Ipv4Packet<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ipv4Packet")
            .field("version", &self.get_version())
            .field("header_length", &self.get_header_length())
            .field("dscp", &self.get_dscp())
            .field("ecn", &self.get_ecn())
            .field("total_length", &self.get_total_length())
            .field("identification", &self.get_identification())
            .field(
                "flags_and_fragment_offset",
                &self.get_flags_and_fragment_offset(),
            )
            .field("ttl", &self.get_ttl())
            .field("protocol", &self.get_protocol())
            .field("checksum", &self.get_checksum())
            .field("source", &self.get_source())
            .field("destination", &self.get_destination())
            .field("options_raw", &self.get_options_raw())
            .field("payload", &fmt_payload(self.payload()))
            .finish()
    }
}

/// The type of an IPv4 header option.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Ipv4OptionType {
    EndOfList,
    NoOp,
    RecordRoute,
    Timestamp,
    Security,
    LooseSourceRoute,
    StrictSourceRoute,
    Other(u8),
}

impl Ipv4OptionType {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::EndOfList => 0,
            Self::NoOp => 1,
            Self::RecordRoute => 7,
            Self::Timestamp => 68,
            Self::Security => 130,
            Self::LooseSourceRoute => 131,
            Self::StrictSourceRoute => 137,
            Self::Other(id) => id,
        }
    }
}

impl From<u8> for Ipv4OptionType {
    fn from(val: u8) -> Self {
        match val {
            0 => Self::EndOfList,
            1 => Self::NoOp,
            7 => Self::RecordRoute,
            68 => Self::Timestamp,
            130 => Self::Security,
            131 => Self::LooseSourceRoute,
            137 => Self::StrictSourceRoute,
            id => Self::Other(id),
        }
    }
}

/// A single decoded IPv4 header option.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Ipv4Option {
    pub option_type: Ipv4OptionType,
    pub data: Vec<u8>,
}

/// Decode an IPv4 options region.
///
/// `NoOp` is a single byte with no length field and `EndOfList` terminates
/// the walk immediately.  Every other option carries a length byte covering
/// the type, length and data bytes, which must be at least 2 and must not
/// overrun the region.  At most [`MAX_OPTIONS`] options are retained, later
/// ones are dropped.
pub fn parse_options(region: &[u8]) -> Result<Vec<Ipv4Option>> {
    let mut options = Vec::new();
    let mut offset = 0;
    while offset < region.len() {
        let option_type = Ipv4OptionType::from(region[offset]);
        match option_type {
            Ipv4OptionType::EndOfList => break,
            Ipv4OptionType::NoOp => {
                if options.len() < MAX_OPTIONS {
                    options.push(Ipv4Option {
                        option_type,
                        data: Vec::new(),
                    });
                }
                offset += 1;
            }
            _ => {
                let Some(&length) = region.get(offset + 1) else {
                    return Err(Error::Malformed(
                        "Ipv4Option",
                        format!("option {} is missing a length byte", option_type.id()),
                    ));
                };
                let length = usize::from(length);
                if length < 2 {
                    return Err(Error::Malformed(
                        "Ipv4Option",
                        format!("option {} length {length} is below 2", option_type.id()),
                    ));
                }
                if offset + length > region.len() {
                    return Err(Error::Malformed(
                        "Ipv4Option",
                        format!(
                            "option {} length {length} overruns the options region",
                            option_type.id()
                        ),
                    ));
                }
                if options.len() < MAX_OPTIONS {
                    options.push(Ipv4Option {
                        option_type,
                        data: region[offset + 2..offset + length].to_vec(),
                    });
                }
                offset += length;
            }
        }
    }
    Ok(options)
}
