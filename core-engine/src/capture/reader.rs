//! Capture Reader
//!
//! Format detection by magic number, then `pcap-file` does the framing.

use std::path::Path;
use std::time::Duration;

use pcap_file::pcap::PcapReader;
use pcap_file::pcapng::{Block, PcapNgReader};
use pcap_file::DataLink;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// ============================================================================
// MAGIC NUMBERS
// ============================================================================

const PCAP_MAGIC_US: [u8; 4] = [0xa1, 0xb2, 0xc3, 0xd4];
const PCAP_MAGIC_US_LE: [u8; 4] = [0xd4, 0xc3, 0xb2, 0xa1];
const PCAP_MAGIC_NS: [u8; 4] = [0xa1, 0xb2, 0x3c, 0x4d];
const PCAP_MAGIC_NS_LE: [u8; 4] = [0x4d, 0x3c, 0xb2, 0xa1];
const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];

// ============================================================================
// DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureFormat {
    Pcap,
    PcapNg,
}

/// Link layer framing of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkType {
    Ethernet,
    /// Bare IP (version taken from the first nibble)
    RawIp,
    LinuxSll,
    Other,
}

impl From<DataLink> for LinkType {
    fn from(link: DataLink) -> Self {
        match link {
            DataLink::ETHERNET => LinkType::Ethernet,
            DataLink::RAW | DataLink::IPV4 | DataLink::IPV6 => LinkType::RawIp,
            DataLink::LINUX_SLL => LinkType::LinuxSll,
            _ => LinkType::Other,
        }
    }
}

/// One frame as stored in the capture
#[derive(Debug, Clone)]
pub struct CapturedPacket {
    /// Zero-based position in the capture
    pub index: usize,
    pub timestamp: Duration,
    pub orig_len: u32,
    pub link_type: LinkType,
    pub data: Vec<u8>,
}

/// A fully-read capture file
#[derive(Debug, Clone)]
pub struct Capture {
    pub format: CaptureFormat,
    pub packets: Vec<CapturedPacket>,
    /// Set when the file ended mid-record; the packets before it are kept
    pub truncated: bool,
}

impl Capture {
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

// ============================================================================
// READING
// ============================================================================

/// Detect the capture format from the leading magic number
pub fn detect_format(bytes: &[u8]) -> CoreResult<CaptureFormat> {
    let magic: [u8; 4] = bytes
        .get(..4)
        .and_then(|m| m.try_into().ok())
        .ok_or_else(|| CoreError::Capture("file too short for a capture header".to_string()))?;

    match magic {
        PCAP_MAGIC_US | PCAP_MAGIC_US_LE | PCAP_MAGIC_NS | PCAP_MAGIC_NS_LE => Ok(CaptureFormat::Pcap),
        PCAPNG_MAGIC => Ok(CaptureFormat::PcapNg),
        _ => Err(CoreError::Capture(format!(
            "unrecognised capture magic {:02x}{:02x}{:02x}{:02x}",
            magic[0], magic[1], magic[2], magic[3]
        ))),
    }
}

/// Read a capture held in memory
pub fn read_capture(bytes: &[u8]) -> CoreResult<Capture> {
    match detect_format(bytes)? {
        CaptureFormat::Pcap => read_pcap(bytes),
        CaptureFormat::PcapNg => read_pcapng(bytes),
    }
}

/// Read a capture file from disk
pub fn read_capture_file<P: AsRef<Path>>(path: P) -> CoreResult<Capture> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.display());
    read_capture(&bytes)
}

fn read_pcap(bytes: &[u8]) -> CoreResult<Capture> {
    let mut reader = PcapReader::new(bytes)?;
    let link_type = LinkType::from(reader.header().datalink);

    let mut packets = Vec::new();
    let mut truncated = false;

    while let Some(next) = reader.next_packet() {
        match next {
            Ok(packet) => {
                packets.push(CapturedPacket {
                    index: packets.len(),
                    timestamp: packet.timestamp,
                    orig_len: packet.orig_len,
                    link_type,
                    data: packet.data.into_owned(),
                });
            }
            Err(e) => {
                log::warn!("Capture ended early after {} packets: {}", packets.len(), e);
                truncated = true;
                break;
            }
        }
    }

    Ok(Capture { format: CaptureFormat::Pcap, packets, truncated })
}

fn read_pcapng(bytes: &[u8]) -> CoreResult<Capture> {
    let mut reader = PcapNgReader::new(bytes)?;

    // Interface link types in declaration order; EPBs refer to them by id
    let mut interfaces: Vec<LinkType> = Vec::new();
    let mut packets = Vec::new();
    let mut truncated = false;

    while let Some(next) = reader.next_block() {
        let block = match next {
            Ok(block) => block,
            Err(e) => {
                log::warn!("Capture ended early after {} packets: {}", packets.len(), e);
                truncated = true;
                break;
            }
        };

        match block {
            Block::InterfaceDescription(idb) => {
                interfaces.push(LinkType::from(idb.linktype));
            }
            Block::EnhancedPacket(epb) => {
                let link_type = interfaces
                    .get(epb.interface_id as usize)
                    .copied()
                    .unwrap_or(LinkType::Ethernet);
                packets.push(CapturedPacket {
                    index: packets.len(),
                    timestamp: epb.timestamp,
                    orig_len: epb.original_len,
                    link_type,
                    data: epb.data.into_owned(),
                });
            }
            Block::SimplePacket(spb) => {
                let link_type = interfaces.first().copied().unwrap_or(LinkType::Ethernet);
                packets.push(CapturedPacket {
                    index: packets.len(),
                    timestamp: Duration::ZERO,
                    orig_len: spb.original_len,
                    link_type,
                    data: spb.data.into_owned(),
                });
            }
            _ => {}
        }
    }

    Ok(Capture { format: CaptureFormat::PcapNg, packets, truncated })
}
