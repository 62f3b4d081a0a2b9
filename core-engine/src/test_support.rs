//! Synthetic frames and capture files for tests.

use std::borrow::Cow;
use std::time::Duration;

use etherparse::PacketBuilder;
use pcap_file::pcap::{PcapHeader, PcapPacket, PcapWriter};
use pcap_file::pcapng::blocks::enhanced_packet::EnhancedPacketBlock;
use pcap_file::pcapng::blocks::interface_description::InterfaceDescriptionBlock;
use pcap_file::pcapng::blocks::simple_packet::SimplePacketBlock;
use pcap_file::pcapng::PcapNgWriter;
use pcap_file::DataLink;

use crate::model::ensemble::{Aggregation, Node, SplitRule, Tree, TreeEnsemble};

const SRC_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 0x01];
const DST_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 0x02];

pub fn tcp_frame(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv4([192, 168, 1, 10], [192, 168, 1, 20], 64)
        .tcp(src_port, dst_port, 1000, 4096)
        .syn();
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).expect("tcp frame");
    frame
}

pub fn udp_frame(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 128)
        .udp(src_port, dst_port);
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).expect("udp frame");
    frame
}

pub fn icmp_frame() -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv4([10, 0, 0, 1], [10, 0, 0, 3], 255)
        .icmpv4_echo_request(7, 1);
    let mut frame = Vec::with_capacity(builder.size(0));
    builder.write(&mut frame, &[]).expect("icmp frame");
    frame
}

pub fn ipv6_udp_frame(src_port: u16, dst_port: u16) -> Vec<u8> {
    let mut src = [0u8; 16];
    src[15] = 1;
    let mut dst = [0u8; 16];
    dst[15] = 2;
    let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv6(src, dst, 32)
        .udp(src_port, dst_port);
    let mut frame = Vec::with_capacity(builder.size(0));
    builder.write(&mut frame, &[]).expect("ipv6 frame");
    frame
}

pub fn raw_ip_tcp_frame() -> Vec<u8> {
    let builder = PacketBuilder::ipv4([172, 16, 0, 1], [172, 16, 0, 2], 50).tcp(4444, 22, 1, 512);
    let mut frame = Vec::with_capacity(builder.size(0));
    builder.write(&mut frame, &[]).expect("raw ip frame");
    frame
}

/// Linux cooked (SLL) framing around an IP packet
pub fn sll_frame(protocol: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(16 + payload.len());
    frame.extend_from_slice(&0u16.to_be_bytes()); // packet type: to us
    frame.extend_from_slice(&1u16.to_be_bytes()); // ARPHRD_ETHER
    frame.extend_from_slice(&6u16.to_be_bytes());
    frame.extend_from_slice(&[0x02, 0, 0, 0, 0, 0x01, 0, 0]);
    frame.extend_from_slice(&protocol.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Classic pcap file with an Ethernet link header
pub fn pcap_bytes(frames: &[Vec<u8>]) -> Vec<u8> {
    pcap_bytes_with_link(frames, DataLink::ETHERNET)
}

pub fn pcap_bytes_with_link(frames: &[Vec<u8>], datalink: DataLink) -> Vec<u8> {
    let header = PcapHeader { datalink, ..Default::default() };
    let mut writer = PcapWriter::with_header(Vec::new(), header).expect("pcap header");
    for (i, frame) in frames.iter().enumerate() {
        let packet = PcapPacket::new(Duration::from_millis(i as u64 * 10), frame.len() as u32, frame);
        writer.write_packet(&packet).expect("pcap packet");
    }
    writer.into_writer()
}

pub fn pcapng_bytes(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut writer = PcapNgWriter::new(Vec::new()).expect("pcapng section");
    writer
        .write_pcapng_block(InterfaceDescriptionBlock {
            linktype: DataLink::ETHERNET,
            snaplen: 0xffff,
            options: vec![],
        })
        .expect("pcapng interface");
    for (i, frame) in frames.iter().enumerate() {
        writer
            .write_pcapng_block(EnhancedPacketBlock {
                interface_id: 0,
                timestamp: Duration::from_millis(i as u64),
                original_len: frame.len() as u32,
                data: Cow::Borrowed(frame.as_slice()),
                options: vec![],
            })
            .expect("pcapng packet");
    }
    writer.into_inner()
}

/// pcapng with one interface and Simple Packet Blocks (no interface id, no timestamp)
pub fn pcapng_simple_bytes(frames: &[Vec<u8>], linktype: DataLink) -> Vec<u8> {
    let mut writer = PcapNgWriter::new(Vec::new()).expect("pcapng section");
    writer
        .write_pcapng_block(InterfaceDescriptionBlock { linktype, snaplen: 0xffff, options: vec![] })
        .expect("pcapng interface");
    for frame in frames {
        writer
            .write_pcapng_block(SimplePacketBlock {
                original_len: frame.len() as u32,
                data: Cow::Borrowed(frame.as_slice()),
            })
            .expect("pcapng simple packet");
    }
    writer.into_inner()
}

/// Five-class boosted model over the 78-slot packet layout.
///
/// dst_port (slot 4) == 80 → DDoS, dst_port 22 → Port Scan, ICMP (slot 5) →
/// Malware, anything else → Normal. Margins are large so the winning class
/// carries > 0.95 probability.
pub fn packet_model() -> TreeEnsemble {
    let stump = |class_index: usize, feature: usize, lo: f64, hi: f64| Tree {
        class_index,
        nodes: vec![
            Node::Split { feature, threshold: lo, left: 1, right: 2, missing_left: true },
            Node::Leaf { value: vec![0.0] },
            Node::Split { feature, threshold: hi, left: 3, right: 4, missing_left: true },
            Node::Leaf { value: vec![6.0] },
            Node::Leaf { value: vec![0.0] },
        ],
    };

    TreeEnsemble {
        name: Some("packet-test".to_string()),
        aggregation: Aggregation::Softmax,
        num_features: crate::features::FEATURE_COUNT,
        num_classes: 5,
        base_score: vec![3.0, 0.0, 0.0, 0.0, 0.0],
        split_rule: SplitRule::LessThan,
        class_labels: vec![],
        feature_names: vec![],
        trees: vec![
            // dst_port in [80, 81) → DDoS
            stump(1, 4, 80.0, 81.0),
            // dst_port in [22, 23) → Port Scan
            stump(2, 4, 22.0, 23.0),
            // is_icmp in [1, 2) → Malware
            stump(4, 5, 1.0, 2.0),
            // lift the DDoS/Port Scan/Malware leaves above the Normal base score
            stump(1, 4, 80.0, 81.0),
            stump(2, 4, 22.0, 23.0),
            stump(4, 5, 1.0, 2.0),
        ],
    }
}
