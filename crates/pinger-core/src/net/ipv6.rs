use crate::config::PrivilegeMode;
use crate::error::{Error, ErrorKind, Result};
use crate::net::common::ErrorMapper;
use crate::net::socket::{RecvMeta, Socket};
use crate::net::MAX_PACKET_SIZE;
use crate::probe::{decode_send_timestamp, IcmpError, Probe, Reply, ReplyKind};
use crate::types::{PayloadPattern, PayloadSize, ProbeId, TimeToLive};
use pinger_packet::checksum::icmp_ipv6_checksum;
use pinger_packet::icmpv6::echo::EchoPacket;
use pinger_packet::icmpv6::{IcmpCode, IcmpPacket, IcmpType};
use pinger_packet::ipv6::{walk_extension_headers, Ipv6Packet};
use pinger_packet::IpProtocol;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::time::SystemTime;
use tracing::instrument;

/// The offset of the original datagram within an `ICMPv6` error message.
const ICMP_ERROR_PAYLOAD_OFFSET: usize = 8;

/// `IPv6` probe dispatch and reply parsing.
///
/// Only echo probes are supported for `IPv6`.
#[derive(Debug)]
pub struct Ipv6 {
    pub src_addr: Ipv6Addr,
    pub dest_addr: Ipv6Addr,
    pub identifier: ProbeId,
    pub payload_size: PayloadSize,
    pub payload_pattern: PayloadPattern,
    pub privilege_mode: PrivilegeMode,
}

impl Ipv6 {
    #[instrument(skip(self, socket), level = "trace")]
    pub fn dispatch_probe<S: Socket>(&self, socket: &mut S, probe: Probe) -> Result<()> {
        let payload_size = usize::from(self.payload_size.0);
        let packet_size = payload_size + EchoPacket::minimum_packet_size();
        if packet_size > MAX_PACKET_SIZE {
            return Err(Error::InvalidPacketSize(packet_size));
        }
        let mut payload_buf = [0_u8; MAX_PACKET_SIZE];
        let payload = &mut payload_buf[..payload_size];
        payload.fill(self.payload_pattern.0);
        crate::probe::encode_send_timestamp(payload, probe.sent);
        let mut icmp_buf = [0_u8; MAX_PACKET_SIZE];
        let mut icmp = EchoPacket::new(&mut icmp_buf[..packet_size])?;
        icmp.set_icmp_type(IcmpType::EchoRequest);
        icmp.set_icmp_code(IcmpCode(0));
        icmp.set_identifier(probe.identifier.0);
        icmp.set_sequence(probe.sequence.0);
        icmp.set_payload(payload);
        // the kernel recomputes this on send, set for completeness
        icmp.set_checksum(icmp_ipv6_checksum(
            icmp.packet(),
            self.src_addr,
            self.dest_addr,
        ));
        let remote_addr = SocketAddr::new(IpAddr::V6(self.dest_addr), 0);
        socket
            .send_to(icmp.packet(), remote_addr)
            .map_err(Error::IoError)
            .map_err(|err| ErrorMapper::probe_failed(err, ErrorKind::HostUnreachable))
            .map_err(|err| ErrorMapper::probe_failed(err, ErrorKind::NetUnreachable))?;
        Ok(())
    }

    /// Receive and parse the next datagram, if any.
    ///
    /// `ICMPv6` sockets deliver the ICMP message without the IP header, the
    /// hop limit comes from ancillary data only.
    #[instrument(skip(self, socket), level = "trace")]
    pub fn recv_reply<S: Socket>(&self, socket: &mut S) -> Result<Option<Reply>> {
        let mut buf = [0_u8; MAX_PACKET_SIZE];
        let meta = match socket.recv_msg(&mut buf) {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::Std(std::io::ErrorKind::WouldBlock) => {
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let recv = SystemTime::now();
        match self.parse_reply(&buf[..meta.bytes], &meta, recv) {
            Ok(reply) => Ok(reply),
            Err(err) => {
                tracing::debug!(?err, "discarded unparseable datagram");
                Ok(None)
            }
        }
    }

    /// Drain one kernel queued `ICMPv6` error, if any.
    #[instrument(skip(self, socket), level = "trace")]
    pub fn recv_queued_error<S: Socket>(&self, socket: &mut S) -> Result<Option<Reply>> {
        let mut buf = [0_u8; MAX_PACKET_SIZE];
        let Some(queued) = socket.recv_queued_error(&mut buf)? else {
            return Ok(None);
        };
        let recv = SystemTime::now();
        let Ok(original) = EchoPacket::new_view(&buf[..queued.bytes]) else {
            tracing::debug!(?queued, "discarded truncated queued error");
            return Ok(None);
        };
        Ok(Some(Reply {
            recv,
            addr: queued.offender.unwrap_or(IpAddr::V6(self.dest_addr)),
            sequence: original.get_sequence().into(),
            ttl: None,
            bytes: queued.bytes,
            sent: None,
            kind: ReplyKind::IcmpError(IcmpError {
                icmp_type: queued.icmp_type,
                icmp_code: queued.icmp_code,
            }),
        }))
    }

    fn parse_reply(
        &self,
        buf: &[u8],
        meta: &RecvMeta,
        recv: SystemTime,
    ) -> Result<Option<Reply>> {
        let addr = meta.addr.unwrap_or(IpAddr::V6(self.dest_addr));
        self.extract_reply(buf, addr, meta.ttl, recv)
    }

    fn extract_reply(
        &self,
        icmp: &[u8],
        addr: IpAddr,
        ttl: Option<u8>,
        recv: SystemTime,
    ) -> Result<Option<Reply>> {
        let icmp_packet = IcmpPacket::new_view(icmp)?;
        match icmp_packet.get_icmp_type() {
            IcmpType::EchoReply => {
                let echo_reply = EchoPacket::new_view(icmp)?;
                if !self.check_identifier(echo_reply.get_identifier()) {
                    return Ok(None);
                }
                Ok(Some(Reply {
                    recv,
                    addr,
                    sequence: echo_reply.get_sequence().into(),
                    ttl: ttl.map(TimeToLive),
                    bytes: icmp.len(),
                    sent: decode_send_timestamp(echo_reply.payload()),
                    kind: ReplyKind::EchoReply,
                }))
            }
            IcmpType::DestinationUnreachable | IcmpType::PacketTooBig | IcmpType::TimeExceeded => {
                let Some(sequence) = self.extract_original_sequence(icmp)? else {
                    return Ok(None);
                };
                Ok(Some(Reply {
                    recv,
                    addr,
                    sequence,
                    ttl: ttl.map(TimeToLive),
                    bytes: icmp.len(),
                    sent: None,
                    kind: ReplyKind::IcmpError(IcmpError {
                        icmp_type: icmp_packet.get_icmp_type().id(),
                        icmp_code: icmp_packet.get_icmp_code().0,
                    }),
                }))
            }
            _ => Ok(None),
        }
    }

    /// Recover the sequence of the original probe nested in an `ICMPv6` error.
    ///
    /// The nested datagram is a full `IPv6` packet, the extension header
    /// chain is walked to locate the original echo request.
    fn extract_original_sequence(&self, icmp: &[u8]) -> Result<Option<crate::types::Sequence>> {
        let nested = &icmp[icmp.len().min(ICMP_ERROR_PAYLOAD_OFFSET)..];
        let original_ipv6 = Ipv6Packet::new_view(nested)?;
        let walk = walk_extension_headers(&original_ipv6)?;
        if walk.protocol != IpProtocol::IcmpV6 {
            return Ok(None);
        }
        let original = EchoPacket::new_view(&nested[walk.header_size..])?;
        if original.get_icmp_type() != IcmpType::EchoRequest {
            return Ok(None);
        }
        if !self.check_identifier(original.get_identifier()) {
            return Ok(None);
        }
        Ok(Some(original.get_sequence().into()))
    }

    /// The kernel rewrites the echo identifier on the datagram tier, only
    /// the raw tier can match it.
    fn check_identifier(&self, identifier: u16) -> bool {
        self.privilege_mode == PrivilegeMode::Unprivileged || identifier == self.identifier.0
    }
}
