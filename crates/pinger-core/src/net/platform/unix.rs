// libc socket options not exposed by socket2 are set directly
#![allow(unsafe_code)]

use crate::error::{ErrorKind, IoError, IoOperation, IoResult};
use crate::net::socket::{QueuedError, RecvMeta, Socket};
use itertools::Itertools;
use nix::libc;
use nix::sys::select::FdSet;
use nix::sys::socket::{ControlMessageOwned, MsgFlags, SockaddrStorage};
use nix::sys::time::{TimeVal, TimeValLike};
use nix::Error;
use socket2::{Domain, Protocol, SockAddr, Type};
use std::io;
use std::io::IoSliceMut;
use std::net::{IpAddr, SocketAddr};
use std::os::fd::{AsFd, AsRawFd};
use std::time::Duration;
use tracing::instrument;

/// A network socket.
pub struct SocketImpl {
    inner: socket2::Socket,
}

impl SocketImpl {
    fn new(domain: Domain, ty: Type, protocol: Protocol) -> IoResult<Self> {
        Ok(Self {
            inner: socket2::Socket::new(domain, ty, Some(protocol))
                .map_err(|err| IoError::Other(err, IoOperation::NewSocket))?,
        })
    }

    fn set_nonblocking(&self, nonblocking: bool) -> IoResult<()> {
        self.inner
            .set_nonblocking(nonblocking)
            .map_err(|err| IoError::Other(err, IoOperation::SetNonBlocking))
    }

    fn setsockopt(
        &self,
        level: libc::c_int,
        name: libc::c_int,
        value: &[u8],
        op: IoOperation,
    ) -> IoResult<()> {
        let rc = unsafe {
            libc::setsockopt(
                self.inner.as_raw_fd(),
                level,
                name,
                value.as_ptr().cast(),
                value.len() as libc::socklen_t,
            )
        };
        if rc == -1 {
            Err(IoError::Other(io::Error::last_os_error(), op))
        } else {
            Ok(())
        }
    }

    fn setsockopt_int(
        &self,
        level: libc::c_int,
        name: libc::c_int,
        value: libc::c_int,
        op: IoOperation,
    ) -> IoResult<()> {
        self.setsockopt(level, name, &value.to_ne_bytes(), op)
    }
}

impl Socket for SocketImpl {
    #[instrument(level = "trace")]
    fn new_icmp_socket_ipv4(raw: bool) -> IoResult<Self> {
        let ty = if raw { Type::RAW } else { Type::DGRAM };
        let socket = Self::new(Domain::IPV4, ty, Protocol::ICMPV4)?;
        socket.set_nonblocking(true)?;
        Ok(socket)
    }
    #[instrument(level = "trace")]
    fn new_icmp_socket_ipv6(raw: bool) -> IoResult<Self> {
        let ty = if raw { Type::RAW } else { Type::DGRAM };
        let socket = Self::new(Domain::IPV6, ty, Protocol::ICMPV6)?;
        socket.set_nonblocking(true)?;
        Ok(socket)
    }
    #[instrument(skip(self), level = "trace")]
    fn bind(&mut self, address: SocketAddr) -> IoResult<()> {
        self.inner
            .bind(&SockAddr::from(address))
            .map_err(|err| IoError::Bind(err, address))
    }
    #[instrument(skip(self), level = "trace")]
    fn connect(&mut self, address: SocketAddr) -> IoResult<()> {
        tracing::trace!(?address);
        self.inner
            .connect(&SockAddr::from(address))
            .map_err(|err| IoError::Connect(err, address))
    }
    #[instrument(skip(self), level = "trace")]
    fn set_ttl(&mut self, ttl: u32) -> IoResult<()> {
        self.inner
            .set_ttl_v4(ttl)
            .map_err(|err| IoError::Other(err, IoOperation::SetTtl))
    }
    #[instrument(skip(self), level = "trace")]
    fn set_unicast_hops_v6(&mut self, hops: u8) -> IoResult<()> {
        self.inner
            .set_unicast_hops_v6(u32::from(hops))
            .map_err(|err| IoError::Other(err, IoOperation::SetUnicastHopsV6))
    }
    #[instrument(skip(self), level = "trace")]
    fn set_tos(&mut self, tos: u32) -> IoResult<()> {
        self.inner
            .set_tos_v4(tos)
            .map_err(|err| IoError::Other(err, IoOperation::SetTos))
    }
    #[instrument(skip(self), level = "trace")]
    fn set_tclass_v6(&mut self, tclass: u32) -> IoResult<()> {
        self.inner
            .set_tclass_v6(tclass)
            .map_err(|err| IoError::Other(err, IoOperation::SetTclassV6))
    }
    #[instrument(skip(self), level = "trace")]
    fn set_socket_debug(&mut self, enabled: bool) -> IoResult<()> {
        self.setsockopt_int(
            libc::SOL_SOCKET,
            libc::SO_DEBUG,
            libc::c_int::from(enabled),
            IoOperation::SetSocketDebug,
        )
    }
    #[instrument(skip(self), level = "trace")]
    fn set_dont_route(&mut self, enabled: bool) -> IoResult<()> {
        self.setsockopt_int(
            libc::SOL_SOCKET,
            libc::SO_DONTROUTE,
            libc::c_int::from(enabled),
            IoOperation::SetDontRoute,
        )
    }
    #[instrument(skip(self), level = "trace")]
    fn set_linger(&mut self, linger: Option<Duration>) -> IoResult<()> {
        self.inner
            .set_linger(linger)
            .map_err(|err| IoError::Other(err, IoOperation::SetLinger))
    }
    #[instrument(skip(self), level = "trace")]
    fn set_recv_ttl(&mut self) -> IoResult<()> {
        self.setsockopt_int(
            libc::IPPROTO_IP,
            libc::IP_RECVTTL,
            1,
            IoOperation::SetRecvTtl,
        )
    }
    #[instrument(skip(self), level = "trace")]
    fn set_recv_hop_limit(&mut self) -> IoResult<()> {
        self.setsockopt_int(
            libc::IPPROTO_IPV6,
            libc::IPV6_RECVHOPLIMIT,
            1,
            IoOperation::SetRecvHopLimit,
        )
    }
    #[cfg(target_os = "linux")]
    #[instrument(skip(self), level = "trace")]
    fn set_recv_err(&mut self) -> IoResult<()> {
        self.setsockopt_int(
            libc::IPPROTO_IP,
            libc::IP_RECVERR,
            1,
            IoOperation::SetRecvErr,
        )
    }
    #[cfg(not(target_os = "linux"))]
    fn set_recv_err(&mut self) -> IoResult<()> {
        Ok(())
    }
    #[cfg(target_os = "linux")]
    #[instrument(skip(self), level = "trace")]
    fn set_recv_err_v6(&mut self) -> IoResult<()> {
        self.setsockopt_int(
            libc::IPPROTO_IPV6,
            libc::IPV6_RECVERR,
            1,
            IoOperation::SetRecvErr,
        )
    }
    #[cfg(not(target_os = "linux"))]
    fn set_recv_err_v6(&mut self) -> IoResult<()> {
        Ok(())
    }
    #[instrument(skip(self), level = "trace")]
    fn set_ip_options(&mut self, options: &[u8]) -> IoResult<()> {
        self.setsockopt(
            libc::IPPROTO_IP,
            libc::IP_OPTIONS,
            options,
            IoOperation::SetIpOptions,
        )
    }
    #[instrument(skip(self, buf), level = "trace")]
    fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> IoResult<()> {
        tracing::trace!(buf = format!("{:02x?}", buf.iter().format(" ")), ?addr);
        self.inner
            .send_to(buf, &SockAddr::from(addr))
            .map_err(|err| IoError::SendTo(err, addr))?;
        Ok(())
    }
    #[instrument(skip(self), level = "trace")]
    fn is_readable(&mut self, timeout: Duration) -> IoResult<bool> {
        let mut read = FdSet::new();
        read.insert(self.inner.as_fd());
        let readable = nix::sys::select::select(
            None,
            Some(&mut read),
            None,
            None,
            Some(&mut TimeVal::milliseconds(timeout.as_millis() as i64)),
        );
        match readable {
            Ok(readable) => Ok(readable == 1),
            Err(Error::EINTR) => Ok(false),
            Err(err) => Err(IoError::Other(
                std::io::Error::from(err),
                IoOperation::Select,
            )),
        }
    }
    #[instrument(skip(self, buf), level = "trace")]
    fn recv_msg(&mut self, buf: &mut [u8]) -> IoResult<RecvMeta> {
        let mut iov = [IoSliceMut::new(buf)];
        let mut cmsg_buffer = nix::cmsg_space!(libc::c_int);
        let msg = nix::sys::socket::recvmsg::<SockaddrStorage>(
            self.inner.as_raw_fd(),
            &mut iov,
            Some(&mut cmsg_buffer),
            MsgFlags::empty(),
        )
        .map_err(|err| IoError::Other(io::Error::from(err), IoOperation::RecvMsg))?;
        let mut ttl = None;
        for cmsg in msg
            .cmsgs()
            .map_err(|err| IoError::Other(io::Error::from(err), IoOperation::RecvMsg))?
        {
            match cmsg {
                #[cfg(target_os = "linux")]
                ControlMessageOwned::Ipv4Ttl(value) => ttl = u8::try_from(value).ok(),
                ControlMessageOwned::Ipv6HopLimit(value) => ttl = u8::try_from(value).ok(),
                _ => {}
            }
        }
        let addr = msg.address.as_ref().and_then(sockaddr_to_ip);
        let bytes = msg.bytes;
        tracing::trace!(bytes, ?addr, ?ttl);
        Ok(RecvMeta { bytes, addr, ttl })
    }
    #[cfg(target_os = "linux")]
    #[instrument(skip(self, buf), level = "trace")]
    fn recv_queued_error(&mut self, buf: &mut [u8]) -> IoResult<Option<QueuedError>> {
        let mut iov = [IoSliceMut::new(buf)];
        let mut cmsg_buffer =
            nix::cmsg_space!(libc::sock_extended_err, libc::sockaddr_in6);
        let msg = match nix::sys::socket::recvmsg::<SockaddrStorage>(
            self.inner.as_raw_fd(),
            &mut iov,
            Some(&mut cmsg_buffer),
            MsgFlags::MSG_ERRQUEUE | MsgFlags::MSG_DONTWAIT,
        ) {
            Ok(msg) => msg,
            Err(Error::EAGAIN | Error::EINTR) => return Ok(None),
            Err(err) => {
                return Err(IoError::Other(io::Error::from(err), IoOperation::RecvMsg));
            }
        };
        let bytes = msg.bytes;
        let mut queued = None;
        for cmsg in msg
            .cmsgs()
            .map_err(|err| IoError::Other(io::Error::from(err), IoOperation::RecvMsg))?
        {
            match cmsg {
                ControlMessageOwned::Ipv4RecvErr(err, addr) => {
                    queued = Some(QueuedError {
                        bytes,
                        offender: addr.map(|sin| {
                            IpAddr::V4(std::net::Ipv4Addr::from(u32::from_be(
                                sin.sin_addr.s_addr,
                            )))
                        }),
                        icmp_type: err.ee_type,
                        icmp_code: err.ee_code,
                    });
                }
                ControlMessageOwned::Ipv6RecvErr(err, addr) => {
                    queued = Some(QueuedError {
                        bytes,
                        offender: addr.map(|sin6| {
                            IpAddr::V6(std::net::Ipv6Addr::from(sin6.sin6_addr.s6_addr))
                        }),
                        icmp_type: err.ee_type,
                        icmp_code: err.ee_code,
                    });
                }
                _ => {}
            }
        }
        tracing::trace!(bytes, ?queued);
        Ok(queued)
    }
    #[cfg(not(target_os = "linux"))]
    fn recv_queued_error(&mut self, _buf: &mut [u8]) -> IoResult<Option<QueuedError>> {
        Ok(None)
    }
}

fn sockaddr_to_ip(addr: &SockaddrStorage) -> Option<IpAddr> {
    addr.as_sockaddr_in()
        .map(|sin| IpAddr::V4(sin.ip()))
        .or_else(|| addr.as_sockaddr_in6().map(|sin6| IpAddr::V6(sin6.ip())))
}

impl From<&io::Error> for ErrorKind {
    fn from(value: &io::Error) -> Self {
        if value.raw_os_error() == io::Error::from(Error::EINPROGRESS).raw_os_error() {
            Self::InProgress
        } else if value.raw_os_error() == io::Error::from(Error::EHOSTUNREACH).raw_os_error() {
            Self::HostUnreachable
        } else if value.raw_os_error() == io::Error::from(Error::ENETUNREACH).raw_os_error() {
            Self::NetUnreachable
        } else {
            Self::Std(value.kind())
        }
    }
}

// only used for unit tests
impl From<ErrorKind> for io::Error {
    fn from(value: ErrorKind) -> Self {
        match value {
            ErrorKind::InProgress => Self::from(Error::EINPROGRESS),
            ErrorKind::HostUnreachable => Self::from(Error::EHOSTUNREACH),
            ErrorKind::NetUnreachable => Self::from(Error::ENETUNREACH),
            ErrorKind::Std(kind) => Self::from(kind),
        }
    }
}
