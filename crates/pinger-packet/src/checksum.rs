//! The Internet checksum (RFC 1071) for ICMP over IPv4 and IPv6.
//!
//! Callers zero the checksum field of the message before computing, so the
//! same routine serves both building (store the result) and verification
//! (the folded sum over a completed packet is zero).

use crate::IpProtocol;
use std::net::Ipv6Addr;

/// Calculate the checksum for an `IPv4` header.
#[must_use]
pub fn ipv4_header_checksum(data: &[u8]) -> u16 {
    checksum(data)
}

/// Calculate the checksum for an `ICMPv4` packet.
#[must_use]
pub fn icmp_ipv4_checksum(data: &[u8]) -> u16 {
    checksum(data)
}

/// Calculate the checksum for an `ICMPv6` packet.
///
/// Folds in the `IPv6` pseudo-header: source and destination address, the
/// payload length and next-header 58.
#[must_use]
pub fn icmp_ipv6_checksum(data: &[u8], src_addr: Ipv6Addr, dest_addr: Ipv6Addr) -> u16 {
    let mut sum = 0u32;
    sum += ipv6_word_sum(src_addr);
    sum += ipv6_word_sum(dest_addr);
    sum += u32::from(IpProtocol::IcmpV6.id());
    sum += data.len() as u32;
    sum += sum_be_words(data);
    finalize_checksum(sum)
}

fn checksum(data: &[u8]) -> u16 {
    if data.is_empty() {
        return 0;
    }
    finalize_checksum(sum_be_words(data))
}

fn ipv6_word_sum(ip: Ipv6Addr) -> u32 {
    ip.segments().iter().map(|x| u32::from(*x)).sum()
}

/// Sum the buffer as big-endian 16-bit words.
///
/// An odd trailing byte is treated as the high byte of a zero-padded word.
fn sum_be_words(data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(2);
    let mut sum = 0u32;
    for word in chunks.by_ref() {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }
    sum
}

const fn finalize_checksum(mut sum: u32) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }
    !sum as u16
}
