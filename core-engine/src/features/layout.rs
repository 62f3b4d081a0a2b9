//! Packet feature layout
//!
//! Packet models take a 78-slot vector. Only the first six slots carry
//! values; the rest are reserved zeros that still count toward the input
//! width. Any change to the slot names, their order or the slot count
//! must bump `FEATURE_VERSION`, which changes the layout hash.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// SLOTS
// ============================================================================

/// Total number of slots in a packet feature vector
pub const FEATURE_COUNT: usize = 78;

/// Named slots, in vector order. Every slot after these is `reserved_NN`.
pub const NAMED_FEATURES: &[&str] = &[
    "frame_len", // 0: Captured frame length in bytes
    "ip_proto",  // 1: IPv4 protocol number (0 if not IPv4)
    "ip_ttl",    // 2: IPv4 TTL (0 if not IPv4)
    "src_port",  // 3: TCP/UDP source port
    "dst_port",  // 4: TCP/UDP destination port
    "is_icmp",   // 5: 1 for ICMP packets
];

pub const FRAME_LEN: usize = 0;
pub const IP_PROTO: usize = 1;
pub const IP_TTL: usize = 2;
pub const SRC_PORT: usize = 3;
pub const DST_PORT: usize = 4;
pub const IS_ICMP: usize = 5;

/// Slot name, `reserved_NN` past the named slots
pub fn feature_name(index: usize) -> Option<String> {
    if index >= FEATURE_COUNT {
        return None;
    }
    Some(
        NAMED_FEATURES
            .get(index)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("reserved_{:02}", index)),
    )
}

pub fn feature_index(name: &str) -> Option<usize> {
    if let Some(i) = NAMED_FEATURES.iter().position(|&n| n == name) {
        return Some(i);
    }
    name.strip_prefix("reserved_")
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|&i| i >= NAMED_FEATURES.len() && i < FEATURE_COUNT)
}

/// All slot names in order
pub fn feature_names() -> Vec<String> {
    (0..FEATURE_COUNT).filter_map(feature_name).collect()
}

// ============================================================================
// HASH / VALIDATION
// ============================================================================

/// CRC32 of the version byte followed by each NUL-terminated slot name
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);
    for name in feature_names() {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

/// Summary of the active layout, printed by `pulse features`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: feature_names(),
        }
    }
}

/// Reject vectors produced under another layout
pub fn validate_layout(version: u8, hash: u32) -> CoreResult<()> {
    let expected = layout_hash();
    if version == FEATURE_VERSION && hash == expected {
        return Ok(());
    }
    Err(CoreError::Layout(format!(
        "expected v{} ({:08x}), got v{} ({:08x})",
        FEATURE_VERSION, expected, version, hash
    )))
}
