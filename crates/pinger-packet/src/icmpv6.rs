use crate::buffer::Buffer;
use crate::error::{Error, Result};
use std::fmt::{Debug, Formatter};

/// The type of `ICMPv6` packet.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub enum IcmpType {
    EchoRequest,
    EchoReply,
    DestinationUnreachable,
    PacketTooBig,
    TimeExceeded,
    Other(u8),
}

impl IcmpType {
    #[must_use]
    pub const fn id(&self) -> u8 {
        match self {
            Self::DestinationUnreachable => 1,
            Self::PacketTooBig => 2,
            Self::TimeExceeded => 3,
            Self::EchoRequest => 128,
            Self::EchoReply => 129,
            Self::Other(id) => *id,
        }
    }

    /// The name of the packet type.
    ///
    /// Total over all inputs, unrecognized types yield `"Unknown"`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DestinationUnreachable => "Destination Unreachable",
            Self::PacketTooBig => "Packet Too Big",
            Self::TimeExceeded => "Time Exceeded",
            Self::EchoRequest => "Echo Request",
            Self::EchoReply => "Echo Reply",
            Self::Other(_) => "Unknown",
        }
    }
}

impl From<u8> for IcmpType {
    fn from(val: u8) -> Self {
        match val {
            1 => Self::DestinationUnreachable,
            2 => Self::PacketTooBig,
            3 => Self::TimeExceeded,
            128 => Self::EchoRequest,
            129 => Self::EchoReply,
            id => Self::Other(id),
        }
    }
}

/// The `ICMPv6` code.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub struct IcmpCode(pub u8);

impl From<u8> for IcmpCode {
    fn from(val: u8) -> Self {
        Self(val)
    }
}

/// The name of an `ICMPv6` type and code combination.
///
/// Total over all inputs, unrecognized combinations yield `"Unknown Code"`.
#[must_use]
pub const fn code_name(icmp_type: IcmpType, icmp_code: IcmpCode) -> &'static str {
    match (icmp_type, icmp_code.0) {
        (IcmpType::DestinationUnreachable, 0) => "No Route to Destination",
        (IcmpType::DestinationUnreachable, 1) => "Administratively Prohibited",
        (IcmpType::DestinationUnreachable, 3) => "Address Unreachable",
        (IcmpType::DestinationUnreachable, 4) => "Port Unreachable",
        (IcmpType::TimeExceeded, 0) => "Hop Limit Exceeded in Transit",
        (IcmpType::TimeExceeded, 1) => "Fragment Reassembly Time Exceeded",
        _ => "Unknown Code",
    }
}

const TYPE_OFFSET: usize = 0;
const CODE_OFFSET: usize = 1;
const CHECKSUM_OFFSET: usize = 2;

/// A view over the 4 byte prefix common to every `ICMPv6` message.
///
/// Incoming datagrams are classified by type and code before the message
/// specific layout is parsed, so this only ever wraps a received buffer.
pub struct IcmpPacket<'a> {
    buf: Buffer<'a>,
}

impl<'a> IcmpPacket<'a> {
    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        if packet.len() < Self::minimum_packet_size() {
            return Err(Error::InsufficientPacketBuffer(
                String::from("IcmpPacket"),
                Self::minimum_packet_size(),
                packet.len(),
            ));
        }
        Ok(Self {
            buf: Buffer::Immutable(packet),
        })
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        4
    }

    #[must_use]
    pub fn get_icmp_type(&self) -> IcmpType {
        IcmpType::from(self.buf.read(TYPE_OFFSET))
    }

    #[must_use]
    pub fn get_icmp_code(&self) -> IcmpCode {
        IcmpCode::from(self.buf.read(CODE_OFFSET))
    }

    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        u16::from_be_bytes(self.buf.get_bytes(CHECKSUM_OFFSET))
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        self.buf.as_slice()
    }
}

impl Debug for IcmpPacket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcmpPacket")
            .field("icmp_type", &self.get_icmp_type())
            .field("icmp_code", &self.get_icmp_code())
            .field("checksum", &self.get_checksum())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use test_case::test_case;

    #[test]
    fn test_view() {
        let buf = hex!("0104 beef");
        let packet = IcmpPacket::new_view(&buf).unwrap();
        assert_eq!(IcmpType::DestinationUnreachable, packet.get_icmp_type());
        assert_eq!(IcmpCode(4), packet.get_icmp_code());
        assert_eq!(0xbeef, packet.get_checksum());
    }

    #[test]
    fn test_view_unrecognized_type() {
        let buf = hex!("8700 29d4");
        let packet = IcmpPacket::new_view(&buf).unwrap();
        assert_eq!(IcmpType::Other(135), packet.get_icmp_type());
        assert_eq!("Unknown", packet.get_icmp_type().name());
    }

    #[test]
    fn test_view_insufficient_buffer() {
        const SIZE: usize = IcmpPacket::minimum_packet_size();
        let buf = [0_u8; SIZE - 1];
        let err = IcmpPacket::new_view(&buf).unwrap_err();
        assert_eq!(
            Error::InsufficientPacketBuffer(String::from("IcmpPacket"), SIZE, SIZE - 1),
            err
        );
    }

    #[test_case(128, IcmpType::EchoRequest)]
    #[test_case(129, IcmpType::EchoReply)]
    #[test_case(2, IcmpType::PacketTooBig)]
    #[test_case(58, IcmpType::Other(58))]
    fn test_type_id_round_trip(id: u8, icmp_type: IcmpType) {
        assert_eq!(icmp_type, IcmpType::from(id));
        assert_eq!(id, icmp_type.id());
    }

    #[test_case(IcmpType::EchoReply, "Echo Reply")]
    #[test_case(IcmpType::PacketTooBig, "Packet Too Big")]
    #[test_case(IcmpType::Other(200), "Unknown")]
    fn test_type_name(icmp_type: IcmpType, expected: &str) {
        assert_eq!(expected, icmp_type.name());
    }

    #[test_case(IcmpType::DestinationUnreachable, 0, "No Route to Destination")]
    #[test_case(IcmpType::TimeExceeded, 0, "Hop Limit Exceeded in Transit")]
    #[test_case(IcmpType::EchoRequest, 7, "Unknown Code")]
    fn test_code_name(icmp_type: IcmpType, code: u8, expected: &str) {
        assert_eq!(expected, code_name(icmp_type, IcmpCode(code)));
    }
}

pub mod echo {
    use crate::buffer::Buffer;
    use crate::error::{Error, Result};
    use crate::fmt_payload;
    use crate::icmpv6::{IcmpCode, IcmpType};
    use std::fmt::{Debug, Formatter};

    const TYPE_OFFSET: usize = 0;
    const CODE_OFFSET: usize = 1;
    const CHECKSUM_OFFSET: usize = 2;
    const IDENTIFIER_OFFSET: usize = 4;
    const SEQUENCE_OFFSET: usize = 6;
    const PAYLOAD_OFFSET: usize = 8;

    /// An `ICMPv6` echo message.
    ///
    /// Echo request and echo reply share a single layout and differ only in
    /// the type value, so one packet type covers both directions.
    ///
    /// The internal representation is held in network byte order (big-endian) and all accessor
    /// methods take and return data in host byte order, converting as necessary for the given
    /// architecture.
    pub struct EchoPacket<'a> {
        buf: Buffer<'a>,
    }

    impl<'a> EchoPacket<'a> {
        pub fn new(packet: &'a mut [u8]) -> Result<Self> {
            if packet.len() < Self::minimum_packet_size() {
                return Err(Self::insufficient(packet.len()));
            }
            Ok(Self {
                buf: Buffer::Mutable(packet),
            })
        }

        pub fn new_view(packet: &'a [u8]) -> Result<Self> {
            if packet.len() < Self::minimum_packet_size() {
                return Err(Self::insufficient(packet.len()));
            }
            Ok(Self {
                buf: Buffer::Immutable(packet),
            })
        }

        fn insufficient(provided: usize) -> Error {
            Error::InsufficientPacketBuffer(
                String::from("EchoPacket"),
                Self::minimum_packet_size(),
                provided,
            )
        }

        #[must_use]
        pub const fn minimum_packet_size() -> usize {
            PAYLOAD_OFFSET
        }

        #[must_use]
        pub fn get_icmp_type(&self) -> IcmpType {
            IcmpType::from(self.buf.read(TYPE_OFFSET))
        }

        #[must_use]
        pub fn get_icmp_code(&self) -> IcmpCode {
            IcmpCode::from(self.buf.read(CODE_OFFSET))
        }

        #[must_use]
        pub fn get_checksum(&self) -> u16 {
            u16::from_be_bytes(self.buf.get_bytes(CHECKSUM_OFFSET))
        }

        #[must_use]
        pub fn get_identifier(&self) -> u16 {
            u16::from_be_bytes(self.buf.get_bytes(IDENTIFIER_OFFSET))
        }

        #[must_use]
        pub fn get_sequence(&self) -> u16 {
            u16::from_be_bytes(self.buf.get_bytes(SEQUENCE_OFFSET))
        }

        pub fn set_icmp_type(&mut self, val: IcmpType) {
            *self.buf.write(TYPE_OFFSET) = val.id();
        }

        pub fn set_icmp_code(&mut self, val: IcmpCode) {
            *self.buf.write(CODE_OFFSET) = val.0;
        }

        pub fn set_checksum(&mut self, val: u16) {
            self.buf.set_bytes(CHECKSUM_OFFSET, val.to_be_bytes());
        }

        pub fn set_identifier(&mut self, val: u16) {
            self.buf.set_bytes(IDENTIFIER_OFFSET, val.to_be_bytes());
        }

        pub fn set_sequence(&mut self, val: u16) {
            self.buf.set_bytes(SEQUENCE_OFFSET, val.to_be_bytes());
        }

        pub fn set_payload(&mut self, vals: &[u8]) {
            self.buf.as_slice_mut()[PAYLOAD_OFFSET..PAYLOAD_OFFSET + vals.len()]
                .copy_from_slice(vals);
        }

        #[must_use]
        pub fn packet(&self) -> &[u8] {
            self.buf.as_slice()
        }

        #[must_use]
        pub fn payload(&self) -> &[u8] {
            &self.buf.as_slice()[PAYLOAD_OFFSET..]
        }
    }

    impl Debug for EchoPacket<'_> {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("EchoPacket")
                .field("icmp_type", &self.get_icmp_type())
                .field("icmp_code", &self.get_icmp_code())
                .field("checksum", &self.get_checksum())
                .field("identifier", &self.get_identifier())
                .field("sequence", &self.get_sequence())
                .field("payload", &fmt_payload(self.payload()))
                .finish()
        }
    }

}
