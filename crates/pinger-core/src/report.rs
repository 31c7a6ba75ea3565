use crate::pinger::ReplyEvent;
use crate::probe::ReplyKind;
use crate::stats::PingStats;
use std::fmt::Write as _;
use std::net::IpAddr;

/// Format a one-line report for a validated reply.
///
/// The ttl is omitted when unknown and the time is omitted when the reply
/// carried no send timestamp.
#[must_use]
pub fn format_reply(event: &ReplyEvent) -> String {
    let mut line = format!(
        "{} bytes from {}: icmp_seq={}",
        event.bytes, event.addr, event.sequence.0
    );
    if let Some(ttl) = event.ttl {
        let _ = write!(line, " ttl={}", ttl.0);
    }
    if let Some(rtt) = event.rtt {
        let _ = write!(line, " time={:.3} ms", rtt.as_secs_f64() * 1000.0);
    }
    line
}

/// Format a one-line report for an ICMP error reply.
#[must_use]
pub fn format_icmp_error(event: &ReplyEvent) -> String {
    let ReplyKind::IcmpError(err) = event.kind else {
        return format_reply(event);
    };
    let name = match event.addr {
        IpAddr::V4(_) => pinger_packet::icmpv4::code_name(
            pinger_packet::icmpv4::IcmpType::from(err.icmp_type),
            pinger_packet::icmpv4::IcmpCode(err.icmp_code),
        ),
        IpAddr::V6(_) => pinger_packet::icmpv6::code_name(
            pinger_packet::icmpv6::IcmpType::from(err.icmp_type),
            pinger_packet::icmpv6::IcmpCode(err.icmp_code),
        ),
    };
    format!(
        "From {}: icmp_seq={} {}",
        event.addr, event.sequence.0, name
    )
}

/// Format the end-of-run summary.
///
/// The round-trip line is included only when timing data exists.
#[must_use]
pub fn format_summary(stats: &PingStats) -> String {
    let mut summary = format!(
        "{} packets transmitted, {} received, {}% packet loss",
        stats.sent,
        stats.received,
        stats.loss_percent()
    );
    if let (Some(min), Some(avg), Some(max), Some(stdev)) =
        (stats.min(), stats.avg(), stats.max(), stats.stdev())
    {
        let _ = write!(
            summary,
            "\nround-trip min/avg/max/stdev = {:.3}/{:.3}/{:.3}/{:.3} ms",
            min * 1000.0,
            avg * 1000.0,
            max * 1000.0,
            stdev * 1000.0
        );
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::IcmpError;
    use crate::types::{Sequence, TimeToLive};
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn event(ttl: Option<TimeToLive>, rtt: Option<Duration>, kind: ReplyKind) -> ReplyEvent {
        ReplyEvent {
            bytes: 64,
            addr: IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)),
            sequence: Sequence(3),
            ttl,
            rtt,
            kind,
        }
    }

    #[test]
    fn test_format_reply() {
        let event = event(
            Some(TimeToLive(54)),
            Some(Duration::from_micros(12_345)),
            ReplyKind::EchoReply,
        );
        assert_eq!(
            "64 bytes from 192.168.1.1: icmp_seq=3 ttl=54 time=12.345 ms",
            format_reply(&event)
        );
    }

    #[test]
    fn test_format_reply_without_timing() {
        let event = event(Some(TimeToLive(54)), None, ReplyKind::EchoReply);
        assert_eq!(
            "64 bytes from 192.168.1.1: icmp_seq=3 ttl=54",
            format_reply(&event)
        );
    }

    #[test]
    fn test_format_reply_without_ttl() {
        let event = event(None, None, ReplyKind::EchoReply);
        assert_eq!("64 bytes from 192.168.1.1: icmp_seq=3", format_reply(&event));
    }

    #[test]
    fn test_format_icmp_error() {
        let event = event(
            None,
            None,
            ReplyKind::IcmpError(IcmpError {
                icmp_type: 3,
                icmp_code: 1,
            }),
        );
        assert_eq!(
            "From 192.168.1.1: icmp_seq=3 Host Unreachable",
            format_icmp_error(&event)
        );
    }

    #[test]
    fn test_format_summary_no_timing() {
        let mut stats = PingStats::default();
        stats.record_sent();
        stats.record_sent();
        assert_eq!(
            "2 packets transmitted, 0 received, 100% packet loss",
            format_summary(&stats)
        );
    }

    #[test]
    fn test_format_summary_with_timing() {
        let mut stats = PingStats::default();
        for _ in 0..4 {
            stats.record_sent();
            stats.record_received();
        }
        stats.record_rtt(Duration::from_millis(10));
        stats.record_rtt(Duration::from_millis(10));
        let summary = format_summary(&stats);
        assert_eq!(
            "4 packets transmitted, 4 received, 0% packet loss\n\
             round-trip min/avg/max/stdev = 10.000/10.000/10.000/0.000 ms",
            summary
        );
    }
}
