use std::fmt::{Display, Formatter};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// A ping error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A ping error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid packet size: {0}")]
    InvalidPacketSize(usize),
    #[error("invalid packet: {0}")]
    PacketError(#[from] pinger_packet::error::Error),
    #[error("invalid config: {0}")]
    BadConfig(String),
    #[error("IO error: {0}")]
    IoError(#[from] IoError),
    #[error("Probe failed to send: {0}")]
    ProbeFailed(IoError),
    #[error("address {0} in use")]
    AddressInUse(SocketAddr),
    #[error("privilege error: {0}")]
    PrivilegeError(#[from] pinger_privilege::Error),
    #[error("ping error: {0}")]
    Other(String),
}

/// Custom IO error result.
pub type IoResult<T> = std::result::Result<T, IoError>;

/// Custom IO error.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Bind error for {1}: {0}")]
    Bind(io::Error, SocketAddr),
    #[error("Connect error for {1}: {0}")]
    Connect(io::Error, SocketAddr),
    #[error("Sendto error for {1}: {0}")]
    SendTo(io::Error, SocketAddr),
    #[error("Failed to {0}: {1}")]
    Other(io::Error, IoOperation),
}

impl IoError {
    /// Get the custom error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Bind(e, _) | Self::Connect(e, _) | Self::SendTo(e, _) | Self::Other(e, _) => {
                ErrorKind::from(e)
            }
        }
    }
}

/// Custom error kind.
///
/// This includes additional error kinds that are not part of the standard [`io::ErrorKind`].
#[derive(Debug, Eq, PartialEq)]
pub enum ErrorKind {
    InProgress,
    HostUnreachable,
    NetUnreachable,
    Std(io::ErrorKind),
}

/// Io operation.
#[derive(Debug)]
pub enum IoOperation {
    NewSocket,
    SetNonBlocking,
    Select,
    RecvMsg,
    SetTos,
    SetTclassV6,
    SetTtl,
    SetUnicastHopsV6,
    SetSocketDebug,
    SetDontRoute,
    SetLinger,
    SetRecvTtl,
    SetRecvHopLimit,
    SetRecvErr,
    SetIpOptions,
}

impl Display for IoOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewSocket => write!(f, "create new socket"),
            Self::SetNonBlocking => write!(f, "set non-blocking"),
            Self::Select => write!(f, "select"),
            Self::RecvMsg => write!(f, "recv msg"),
            Self::SetTos => write!(f, "set TOS"),
            Self::SetTclassV6 => write!(f, "set TCLASS v6"),
            Self::SetTtl => write!(f, "set TTL"),
            Self::SetUnicastHopsV6 => write!(f, "set unicast hops v6"),
            Self::SetSocketDebug => write!(f, "set SO_DEBUG"),
            Self::SetDontRoute => write!(f, "set SO_DONTROUTE"),
            Self::SetLinger => write!(f, "set SO_LINGER"),
            Self::SetRecvTtl => write!(f, "set recv TTL"),
            Self::SetRecvHopLimit => write!(f, "set recv hop limit"),
            Self::SetRecvErr => write!(f, "set recv err"),
            Self::SetIpOptions => write!(f, "set IP options"),
        }
    }
}
