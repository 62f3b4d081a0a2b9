//! Packet Feature Extraction
//!
//! Six field reads into the 78-slot layout. IP protocol and TTL are only
//! filled for IPv4 frames; ports come from TCP first, then UDP.

use super::layout::{DST_PORT, FRAME_LEN, IP_PROTO, IP_TTL, IS_ICMP, SRC_PORT};
use super::vector::{FeatureExtractor, FeatureVector};
use crate::capture::{DecodedPacket, Transport};

/// Feature view over one decoded packet
pub struct PacketFeatures<'a> {
    packet: &'a DecodedPacket,
}

impl<'a> PacketFeatures<'a> {
    pub fn new(packet: &'a DecodedPacket) -> Self {
        Self { packet }
    }
}

impl FeatureExtractor for PacketFeatures<'_> {
    fn extract(&self, vector: &mut FeatureVector) {
        let packet = self.packet;

        vector.set(FRAME_LEN, packet.frame_len as f32);

        if let Some(ip) = packet.ip.filter(|ip| ip.version == 4) {
            vector.set(IP_PROTO, ip.protocol as f32);
            vector.set(IP_TTL, ip.ttl as f32);
        }

        match packet.transport {
            Transport::Tcp { src_port, dst_port, .. } | Transport::Udp { src_port, dst_port } => {
                vector.set(SRC_PORT, src_port as f32);
                vector.set(DST_PORT, dst_port as f32);
            }
            _ => {}
        }

        if packet.is_icmp() {
            vector.set(IS_ICMP, 1.0);
        }
    }
}

/// Build the feature vector for one packet
pub fn extract(packet: &DecodedPacket) -> FeatureVector {
    let mut vector = FeatureVector::new();
    PacketFeatures::new(packet).extract(&mut vector);
    vector
}
