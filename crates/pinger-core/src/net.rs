use crate::error::Result;
use crate::probe::{Probe, Reply};

/// A channel for sending probes and receiving replies.
#[cfg_attr(test, mockall::automock)]
pub trait Network {
    /// Send a probe.
    fn send_probe(&mut self, probe: Probe) -> Result<()>;
    /// Receive the next available reply, if any.
    ///
    /// Blocks for at most the configured read timeout.
    fn recv_reply(&mut self) -> Result<Option<Reply>>;
}

pub mod channel;
mod common;
mod ipv4;
mod ipv6;
mod platform;
pub mod socket;

pub use channel::{Channel, MAX_PACKET_SIZE};
#[cfg(unix)]
pub use platform::SocketImpl;
