//! Capture Module - PCAP / PCAPNG ingestion
//!
//! Reads capture files into memory and decodes each frame into the handful
//! of fields the feature extractors need.

pub mod decode;
pub mod reader;


pub use decode::{decode, DecodedPacket, IpLayer, TcpFlags, Transport};
pub use reader::{read_capture, read_capture_file, Capture, CaptureFormat, CapturedPacket, LinkType};
