use crate::config::{PrivilegeMode, ProbeKind};
use crate::error::{Error, ErrorKind, Result};
use crate::net::common::ErrorMapper;
use crate::net::socket::{RecvMeta, Socket};
use crate::net::MAX_PACKET_SIZE;
use crate::probe::{
    decode_send_timestamp, ms_since_midnight, IcmpError, Probe, Reply, ReplyKind, TimestampValues,
};
use crate::types::{PayloadPattern, PayloadSize, ProbeId, TimeToLive};
use pinger_packet::checksum::icmp_ipv4_checksum;
use pinger_packet::icmpv4::echo_reply::EchoReplyPacket;
use pinger_packet::icmpv4::echo_request::EchoRequestPacket;
use pinger_packet::icmpv4::timestamp::TimestampPacket;
use pinger_packet::icmpv4::{IcmpCode, IcmpPacket, IcmpType};
use pinger_packet::ipv4::Ipv4Packet;
use pinger_packet::IpProtocol;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::SystemTime;
use tracing::instrument;

/// The offset of the original datagram within an `ICMPv4` error message.
const ICMP_ERROR_PAYLOAD_OFFSET: usize = 8;

/// `IPv4` probe dispatch and reply parsing.
#[derive(Debug)]
pub struct Ipv4 {
    pub dest_addr: Ipv4Addr,
    pub probe_kind: ProbeKind,
    pub identifier: ProbeId,
    pub payload_size: PayloadSize,
    pub payload_pattern: PayloadPattern,
    pub privilege_mode: PrivilegeMode,
}

impl Ipv4 {
    #[instrument(skip(self, socket), level = "trace")]
    pub fn dispatch_probe<S: Socket>(&self, socket: &mut S, probe: Probe) -> Result<()> {
        match probe.kind {
            ProbeKind::Echo => self.dispatch_echo_probe(socket, probe),
            ProbeKind::Timestamp => self.dispatch_timestamp_probe(socket, probe),
        }
    }

    fn dispatch_echo_probe<S: Socket>(&self, socket: &mut S, probe: Probe) -> Result<()> {
        let payload_size = usize::from(self.payload_size.0);
        let packet_size = payload_size + EchoRequestPacket::minimum_packet_size();
        if packet_size > MAX_PACKET_SIZE {
            return Err(Error::InvalidPacketSize(packet_size));
        }
        let mut payload_buf = [0_u8; MAX_PACKET_SIZE];
        let payload = &mut payload_buf[..payload_size];
        payload.fill(self.payload_pattern.0);
        crate::probe::encode_send_timestamp(payload, probe.sent);
        let mut icmp_buf = [0_u8; MAX_PACKET_SIZE];
        let mut icmp = EchoRequestPacket::new(&mut icmp_buf[..packet_size])?;
        icmp.set_icmp_type(IcmpType::EchoRequest);
        icmp.set_icmp_code(IcmpCode(0));
        icmp.set_identifier(probe.identifier.0);
        icmp.set_sequence(probe.sequence.0);
        icmp.set_payload(payload);
        icmp.set_checksum(icmp_ipv4_checksum(icmp.packet()));
        let remote_addr = SocketAddr::new(IpAddr::V4(self.dest_addr), 0);
        socket
            .send_to(icmp.packet(), remote_addr)
            .map_err(Error::IoError)
            .map_err(|err| ErrorMapper::probe_failed(err, ErrorKind::HostUnreachable))
            .map_err(|err| ErrorMapper::probe_failed(err, ErrorKind::NetUnreachable))?;
        Ok(())
    }

    fn dispatch_timestamp_probe<S: Socket>(&self, socket: &mut S, probe: Probe) -> Result<()> {
        let mut icmp_buf = [0_u8; TimestampPacket::minimum_packet_size()];
        let mut icmp = TimestampPacket::new(&mut icmp_buf)?;
        icmp.set_icmp_type(IcmpType::TimestampRequest);
        icmp.set_icmp_code(IcmpCode(0));
        icmp.set_identifier(probe.identifier.0);
        icmp.set_sequence(probe.sequence.0);
        icmp.set_originate(ms_since_midnight(probe.sent));
        icmp.set_receive(0);
        icmp.set_transmit(0);
        icmp.set_checksum(icmp_ipv4_checksum(icmp.packet()));
        let remote_addr = SocketAddr::new(IpAddr::V4(self.dest_addr), 0);
        socket
            .send_to(icmp.packet(), remote_addr)
            .map_err(Error::IoError)
            .map_err(|err| ErrorMapper::probe_failed(err, ErrorKind::HostUnreachable))
            .map_err(|err| ErrorMapper::probe_failed(err, ErrorKind::NetUnreachable))?;
        Ok(())
    }

    /// Receive and parse the next datagram, if any.
    ///
    /// Datagrams which do not parse as a reply to one of our probes are
    /// logged and discarded, they are not errors.
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

    /// Drain one kernel queued ICMP error, if any.
    ///
    /// The receive buffer holds our original echo request, from which the
    /// sequence number is recovered.  The kernel rewrites the echo identifier
    /// on the unprivileged tier so it is not checked here.
    #[instrument(skip(self, socket), level = "trace")]
    pub fn recv_queued_error<S: Socket>(&self, socket: &mut S) -> Result<Option<Reply>> {
        let mut buf = [0_u8; MAX_PACKET_SIZE];
        let Some(queued) = socket.recv_queued_error(&mut buf)? else {
            return Ok(None);
        };
        let recv = SystemTime::now();
        let Ok(original) = EchoRequestPacket::new_view(&buf[..queued.bytes]) else {
            tracing::debug!(?queued, "discarded truncated queued error");
            return Ok(None);
        };
        Ok(Some(Reply {
            recv,
            addr: queued.offender.unwrap_or(IpAddr::V4(self.dest_addr)),
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
        // the raw tier delivers the IP header, the datagram tier does not
        if self.privilege_mode == PrivilegeMode::Privileged {
            let ipv4 = Ipv4Packet::new_view(buf)?;
            let header_size = ipv4.checked_header_size()?;
            let addr = meta.addr.unwrap_or(IpAddr::V4(ipv4.get_source()));
            let ttl = meta.ttl.or(Some(ipv4.get_ttl()));
            self.extract_reply(&buf[header_size..], addr, ttl, recv)
        } else {
            let addr = meta.addr.unwrap_or(IpAddr::V4(self.dest_addr));
            self.extract_reply(buf, addr, meta.ttl, recv)
        }
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
                let echo_reply = EchoReplyPacket::new_view(icmp)?;
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
            IcmpType::TimestampReply if self.probe_kind == ProbeKind::Timestamp => {
                let ts_reply = TimestampPacket::new_view(icmp)?;
                if !self.check_identifier(ts_reply.get_identifier()) {
                    return Ok(None);
                }
                Ok(Some(Reply {
                    recv,
                    addr,
                    sequence: ts_reply.get_sequence().into(),
                    ttl: ttl.map(TimeToLive),
                    bytes: icmp.len(),
                    sent: None,
                    kind: ReplyKind::TimestampReply(TimestampValues {
                        originate: ts_reply.get_originate(),
                        receive: ts_reply.get_receive(),
                        transmit: ts_reply.get_transmit(),
                    }),
                }))
            }
            IcmpType::DestinationUnreachable | IcmpType::TimeExceeded => {
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

    /// Recover the sequence of the original probe nested in an ICMP error.
    fn extract_original_sequence(&self, icmp: &[u8]) -> Result<Option<crate::types::Sequence>> {
        let nested = &icmp[icmp.len().min(ICMP_ERROR_PAYLOAD_OFFSET)..];
        let original_ipv4 = Ipv4Packet::new_view(nested)?;
        if original_ipv4.get_protocol() != IpProtocol::Icmp {
            return Ok(None);
        }
        let header_size = original_ipv4.checked_header_size()?;
        let original = EchoRequestPacket::new_view(&nested[header_size..])?;
        if original.get_icmp_type() != IcmpType::EchoRequest
            && original.get_icmp_type() != IcmpType::TimestampRequest
        {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IoResult;
    use crate::mocket_recv_msg;
    use crate::net::socket::{MockSocket, QueuedError};
    use crate::types::Sequence;
    use hex_literal::hex;
    use mockall::predicate;
    use std::time::{Duration, SystemTime};

    const DEST: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

    fn strategy(privilege_mode: PrivilegeMode) -> Ipv4 {
        Ipv4 {
            dest_addr: DEST,
            probe_kind: ProbeKind::Echo,
            identifier: ProbeId(0x1234),
            payload_size: PayloadSize(4),
            payload_pattern: PayloadPattern(0xaa),
            privilege_mode,
        }
    }

    #[test]
    fn test_dispatch_echo_probe() -> anyhow::Result<()> {
        let expected_send_to_buf = hex!("0800 9075 1234 0001 aaaa aaaa");
        let expected_send_to_addr = SocketAddr::new(IpAddr::V4(DEST), 0);
        let mut mocket = MockSocket::new();
        mocket
            .expect_send_to()
            .with(
                predicate::eq(expected_send_to_buf),
                predicate::eq(expected_send_to_addr),
            )
            .times(1)
            .returning(|_, _| Ok(()));
        let probe = Probe::new(
            ProbeKind::Echo,
            ProbeId(0x1234),
            Sequence(1),
            SystemTime::now(),
        );
        strategy(PrivilegeMode::Privileged).dispatch_probe(&mut mocket, probe)?;
        Ok(())
    }

    #[test]
    fn test_dispatch_timestamp_probe() -> anyhow::Result<()> {
        let sent = SystemTime::UNIX_EPOCH + Duration::from_millis(1000);
        let expected_send_to_buf = hex!("0d00 dce1 1234 0002 000003e8 00000000 00000000");
        let expected_send_to_addr = SocketAddr::new(IpAddr::V4(DEST), 0);
        let mut mocket = MockSocket::new();
        mocket
            .expect_send_to()
            .with(
                predicate::eq(expected_send_to_buf),
                predicate::eq(expected_send_to_addr),
            )
            .times(1)
            .returning(|_, _| Ok(()));
        let probe = Probe::new(
            ProbeKind::Timestamp,
            ProbeId(0x1234),
            Sequence(2),
            sent,
        );
        strategy(PrivilegeMode::Privileged).dispatch_probe(&mut mocket, probe)?;
        Ok(())
    }

    #[test]
    fn test_recv_echo_reply_raw() -> anyhow::Result<()> {
        let resp = hex!(
            "
            4500 0020 0000 0000 4001 0000 0102 0304
            0a00 0001
            0000 0000 1234 0002 0000 0000
            "
        );
        let mut mocket = MockSocket::new();
        mocket.expect_recv_msg().times(1).returning(mocket_recv_msg!(
            resp,
            RecvMeta {
                bytes: 0,
                addr: None,
                ttl: None,
            }
        ));
        let reply = strategy(PrivilegeMode::Privileged)
            .recv_reply(&mut mocket)?
            .ok_or_else(|| anyhow::anyhow!("no reply"))?;
        assert_eq!(IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)), reply.addr);
        assert_eq!(Sequence(2), reply.sequence);
        assert_eq!(Some(TimeToLive(64)), reply.ttl);
        assert_eq!(ReplyKind::EchoReply, reply.kind);
        Ok(())
    }

    #[test]
    fn test_recv_echo_reply_wrong_identifier_raw() -> anyhow::Result<()> {
        let resp = hex!(
            "
            4500 0020 0000 0000 4001 0000 0102 0304
            0a00 0001
            0000 0000 9999 0002 0000 0000
            "
        );
        let mut mocket = MockSocket::new();
        mocket.expect_recv_msg().times(1).returning(mocket_recv_msg!(
            resp,
            RecvMeta {
                bytes: 0,
                addr: None,
                ttl: None,
            }
        ));
        let reply = strategy(PrivilegeMode::Privileged).recv_reply(&mut mocket)?;
        assert_eq!(None, reply);
        Ok(())
    }

    #[test]
    fn test_recv_echo_reply_dgram_ignores_identifier() -> anyhow::Result<()> {
        let resp = hex!("0000 0000 9999 0007 0000 0000");
        let mut mocket = MockSocket::new();
        mocket.expect_recv_msg().times(1).returning(mocket_recv_msg!(
            resp,
            RecvMeta {
                bytes: 0,
                addr: Some(IpAddr::V4(DEST)),
                ttl: Some(57),
            }
        ));
        let reply = strategy(PrivilegeMode::Unprivileged)
            .recv_reply(&mut mocket)?
            .ok_or_else(|| anyhow::anyhow!("no reply"))?;
        assert_eq!(IpAddr::V4(DEST), reply.addr);
        assert_eq!(Sequence(7), reply.sequence);
        assert_eq!(Some(TimeToLive(57)), reply.ttl);
        Ok(())
    }

    #[test]
    fn test_recv_time_exceeded_raw() -> anyhow::Result<()> {
        let resp = hex!(
            "
            4500 0038 0000 0000 ff01 0000 c0a8 0101
            0a00 0002
            0b00 0000 0000 0000
            4500 001c 0000 0000 0101 0000 0a00 0002
            0a00 0001
            0800 0000 1234 0003
            "
        );
        let mut mocket = MockSocket::new();
        mocket.expect_recv_msg().times(1).returning(mocket_recv_msg!(
            resp,
            RecvMeta {
                bytes: 0,
                addr: None,
                ttl: None,
            }
        ));
        let reply = strategy(PrivilegeMode::Privileged)
            .recv_reply(&mut mocket)?
            .ok_or_else(|| anyhow::anyhow!("no reply"))?;
        assert_eq!(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)), reply.addr);
        assert_eq!(Sequence(3), reply.sequence);
        assert_eq!(
            ReplyKind::IcmpError(IcmpError {
                icmp_type: 11,
                icmp_code: 0,
            }),
            reply.kind
        );
        Ok(())
    }

    #[test]
    fn test_recv_unrelated_datagram() -> anyhow::Result<()> {
        // an ICMP router advertisement, not a reply to any probe
        let resp = hex!(
            "
            4500 0020 0000 0000 4001 0000 0102 0304
            0a00 0001
            0900 0000 0000 0000 0000 0000
            "
        );
        let mut mocket = MockSocket::new();
        mocket.expect_recv_msg().times(1).returning(mocket_recv_msg!(
            resp,
            RecvMeta {
                bytes: 0,
                addr: None,
                ttl: None,
            }
        ));
        let reply = strategy(PrivilegeMode::Privileged).recv_reply(&mut mocket)?;
        assert_eq!(None, reply);
        Ok(())
    }

    #[test]
    fn test_recv_truncated_datagram_is_discarded() -> anyhow::Result<()> {
        let resp = hex!("4500 0020");
        let mut mocket = MockSocket::new();
        mocket.expect_recv_msg().times(1).returning(mocket_recv_msg!(
            resp,
            RecvMeta {
                bytes: 0,
                addr: None,
                ttl: None,
            }
        ));
        let reply = strategy(PrivilegeMode::Privileged).recv_reply(&mut mocket)?;
        assert_eq!(None, reply);
        Ok(())
    }

    #[test]
    fn test_recv_queued_error() -> anyhow::Result<()> {
        let original = hex!("0800 0000 0000 0005 aaaa aaaa");
        let mut mocket = MockSocket::new();
        mocket
            .expect_recv_queued_error()
            .times(1)
            .returning(move |buf: &mut [u8]| -> IoResult<Option<QueuedError>> {
                buf[..original.len()].copy_from_slice(&original);
                Ok(Some(QueuedError {
                    bytes: original.len(),
                    offender: Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))),
                    icmp_type: 3,
                    icmp_code: 1,
                }))
            });
        let reply = strategy(PrivilegeMode::Unprivileged)
            .recv_queued_error(&mut mocket)?
            .ok_or_else(|| anyhow::anyhow!("no reply"))?;
        assert_eq!(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)), reply.addr);
        assert_eq!(Sequence(5), reply.sequence);
        assert_eq!(
            ReplyKind::IcmpError(IcmpError {
                icmp_type: 3,
                icmp_code: 1,
            }),
            reply.kind
        );
        Ok(())
    }
}
