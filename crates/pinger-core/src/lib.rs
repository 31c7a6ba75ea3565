//! A network diagnostic probe engine.
//!
//! Sends a configurable stream of ICMP probes to a single target host and
//! publishes an event for each validated reply along with end-of-run
//! round-trip statistics.
//!
//! # Privileges
//!
//! A raw ICMP socket is used when available.  When the raw socket is denied
//! the engine falls back to the unprivileged datagram ICMP socket tier,
//! where the kernel matches replies to this process and options which
//! require the raw tier (flood, preload, record-route and the IP timestamp
//! option) are rejected.
//!
//! # Features
//!
//! - `ICMPv4` echo and timestamp probes and `ICMPv6` echo probes
//! - raw and unprivileged datagram socket tiers
//! - probe count, interval, timeout, linger, flood and preload pacing
//! - round-trip min/avg/max/stdev statistics with duplicate detection
//! - the `IPv4` record-route and timestamp header options
//!
//! # Examples
//!
//! Ping a target four times and print each reply:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use pinger_core::{Builder, MaxProbes, PingEvent};
//! use std::net::{IpAddr, Ipv4Addr};
//! use std::num::NonZeroUsize;
//!
//! let addr = IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1));
//! let count = NonZeroUsize::new(4).ok_or_else(|| anyhow::anyhow!("count"))?;
//! let pinger = Builder::new(addr).count(Some(MaxProbes(count))).build()?;
//! pinger.run_with(|event| match event {
//!     PingEvent::Reply(reply) => println!("{}", pinger_core::format_reply(reply)),
//!     PingEvent::IcmpError(reply) => println!("{}", pinger_core::format_icmp_error(reply)),
//!     PingEvent::Summary(stats) => println!("{}", pinger_core::format_summary(stats)),
//!     PingEvent::Duplicate(_) => {}
//! })?;
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]

mod builder;
mod config;
mod error;
mod net;
mod pinger;
mod probe;
mod report;
mod stats;
mod types;

pub use builder::Builder;
pub use config::{defaults, Config, IpTimestampFlavor, PrivilegeMode, ProbeKind};
pub use error::{Error, ErrorKind, IoError, IoOperation, Result};
pub use net::{Channel, Network, MAX_PACKET_SIZE};
#[cfg(unix)]
pub use net::SocketImpl;
pub use pinger::{CancellationToken, PingEvent, Pinger, ReplyEvent};
pub use probe::{
    IcmpError, Probe, Reply, ReplyKind, TimestampValues, SEND_TIMESTAMP_SIZE,
};
pub use report::{format_icmp_error, format_reply, format_summary};
pub use stats::PingStats;
pub use types::{
    MaxProbes, PayloadPattern, PayloadSize, Preload, ProbeId, Sequence, TimeToLive, TypeOfService,
};
