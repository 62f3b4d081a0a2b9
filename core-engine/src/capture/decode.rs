//! Packet Decoding
//!
//! Pulls IP/transport fields out of a frame with `etherparse` and renders a
//! one-line summary. Frames that fail to parse still produce a
//! [`DecodedPacket`] carrying their length, so every captured frame can be
//! scored.

use std::net::IpAddr;

use etherparse::{NetSlice, SlicedPacket, TransportSlice};
use serde::{Deserialize, Serialize};

use super::reader::{CapturedPacket, LinkType};

const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86dd;
const SLL_HEADER_LEN: usize = 16;

const IPPROTO_ICMP: u8 = 1;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpFlags {
    pub fin: bool,
    pub syn: bool,
    pub rst: bool,
    pub psh: bool,
    pub ack: bool,
    pub urg: bool,
    pub ece: bool,
    pub cwr: bool,
}

impl TcpFlags {
    /// Letter form, e.g. "SA" for SYN+ACK
    pub fn letters(&self) -> String {
        [
            (self.fin, 'F'),
            (self.syn, 'S'),
            (self.rst, 'R'),
            (self.psh, 'P'),
            (self.ack, 'A'),
            (self.urg, 'U'),
            (self.ece, 'E'),
            (self.cwr, 'C'),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, c)| *c)
        .collect()
    }
}

/// Network layer fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpLayer {
    pub version: u8,
    pub src: IpAddr,
    pub dst: IpAddr,
    /// IPv4 protocol or IPv6 next header
    pub protocol: u8,
    /// IPv4 TTL or IPv6 hop limit
    pub ttl: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    Tcp { src_port: u16, dst_port: u16, flags: TcpFlags },
    Udp { src_port: u16, dst_port: u16 },
    Icmp,
    Icmpv6,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedPacket {
    /// Zero-based position in the capture
    pub index: usize,
    /// Captured frame length in bytes
    pub frame_len: usize,
    pub link: LinkType,
    pub ip: Option<IpLayer>,
    pub transport: Transport,
    pub summary: String,
}

impl DecodedPacket {
    pub fn is_ipv4(&self) -> bool {
        matches!(self.ip, Some(ip) if ip.version == 4)
    }

    pub fn is_icmp(&self) -> bool {
        match self.transport {
            Transport::Icmp => true,
            _ => matches!(self.ip, Some(ip) if ip.version == 4 && ip.protocol == IPPROTO_ICMP),
        }
    }

    pub fn ports(&self) -> Option<(u16, u16)> {
        match self.transport {
            Transport::Tcp { src_port, dst_port, .. } | Transport::Udp { src_port, dst_port } => {
                Some((src_port, dst_port))
            }
            _ => None,
        }
    }
}

// ============================================================================
// DECODING
// ============================================================================

/// Decode one captured frame
pub fn decode(packet: &CapturedPacket) -> DecodedPacket {
    let data = packet.data.as_slice();

    let (sliced, link_label) = match packet.link_type {
        LinkType::Ethernet => (SlicedPacket::from_ethernet(data).ok(), Some("Ether")),
        LinkType::RawIp => (SlicedPacket::from_ip(data).ok(), None),
        LinkType::LinuxSll => (slice_linux_sll(data), Some("SLL")),
        LinkType::Other => (None, None),
    };

    let mut decoded = DecodedPacket {
        index: packet.index,
        frame_len: data.len(),
        link: packet.link_type,
        ip: None,
        transport: Transport::None,
        summary: String::new(),
    };

    if let Some(sliced) = sliced {
        decoded.ip = ip_layer(&sliced);
        decoded.transport = transport_layer(&sliced);
    }

    decoded.summary = summarize(&decoded, link_label, data);
    decoded
}

/// Linux cooked capture: 16-byte header, protocol type in bytes 14..16
fn slice_linux_sll(data: &[u8]) -> Option<SlicedPacket<'_>> {
    if data.len() < SLL_HEADER_LEN {
        return None;
    }
    let proto = u16::from_be_bytes([data[14], data[15]]);
    match proto {
        ETHERTYPE_IPV4 | ETHERTYPE_IPV6 => SlicedPacket::from_ip(&data[SLL_HEADER_LEN..]).ok(),
        _ => None,
    }
}

fn ip_layer(sliced: &SlicedPacket<'_>) -> Option<IpLayer> {
    match &sliced.net {
        Some(NetSlice::Ipv4(ipv4)) => {
            let header = ipv4.header();
            Some(IpLayer {
                version: 4,
                src: IpAddr::V4(header.source_addr()),
                dst: IpAddr::V4(header.destination_addr()),
                protocol: header.protocol().0,
                ttl: header.ttl(),
            })
        }
        Some(NetSlice::Ipv6(ipv6)) => {
            let header = ipv6.header();
            Some(IpLayer {
                version: 6,
                src: IpAddr::V6(header.source_addr()),
                dst: IpAddr::V6(header.destination_addr()),
                protocol: header.next_header().0,
                ttl: header.hop_limit(),
            })
        }
        _ => None,
    }
}

fn transport_layer(sliced: &SlicedPacket<'_>) -> Transport {
    match &sliced.transport {
        Some(TransportSlice::Tcp(tcp)) => Transport::Tcp {
            src_port: tcp.source_port(),
            dst_port: tcp.destination_port(),
            flags: TcpFlags {
                fin: tcp.fin(),
                syn: tcp.syn(),
                rst: tcp.rst(),
                psh: tcp.psh(),
                ack: tcp.ack(),
                urg: tcp.urg(),
                ece: tcp.ece(),
                cwr: tcp.cwr(),
            },
        },
        Some(TransportSlice::Udp(udp)) => Transport::Udp {
            src_port: udp.source_port(),
            dst_port: udp.destination_port(),
        },
        Some(TransportSlice::Icmpv4(_)) => Transport::Icmp,
        Some(TransportSlice::Icmpv6(_)) => Transport::Icmpv6,
        _ => Transport::None,
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

/// One-line description, e.g. `Ether / IP / TCP 10.0.0.1:1234 > 10.0.0.2:80 S`
fn summarize(packet: &DecodedPacket, link_label: Option<&str>, data: &[u8]) -> String {
    let mut layers: Vec<String> = Vec::new();
    if let Some(label) = link_label {
        layers.push(label.to_string());
    }

    let Some(ip) = packet.ip else {
        return match (packet.link, link_label) {
            (LinkType::Ethernet, Some(label)) if data.len() >= 14 => {
                let ether_type = u16::from_be_bytes([data[12], data[13]]);
                format!("{} / type 0x{:04x} ({} bytes)", label, ether_type, data.len())
            }
            _ => format!("Raw ({} bytes)", data.len()),
        };
    };

    layers.push(if ip.version == 4 { "IP".to_string() } else { "IPv6".to_string() });

    let endpoints = match packet.transport {
        Transport::Tcp { src_port, dst_port, flags } => {
            layers.push("TCP".to_string());
            format!("{}:{} > {}:{} {}", ip.src, src_port, ip.dst, dst_port, flags.letters())
        }
        Transport::Udp { src_port, dst_port } => {
            layers.push("UDP".to_string());
            format!("{}:{} > {}:{}", ip.src, src_port, ip.dst, dst_port)
        }
        Transport::Icmp => {
            layers.push("ICMP".to_string());
            format!("{} > {}", ip.src, ip.dst)
        }
        Transport::Icmpv6 => {
            layers.push("ICMPv6".to_string());
            format!("{} > {}", ip.src, ip.dst)
        }
        Transport::None => format!("{} > {} proto {}", ip.src, ip.dst, ip.protocol),
    };

    format!("{} {}", layers.join(" / "), endpoints).trim_end().to_string()
}
