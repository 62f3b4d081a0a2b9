//! Central Configuration Constants
//!
//! Single source of truth for analysis defaults shared by the CLI and the
//! REST server.

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Pulse Sniffer";

/// Capture file extensions accepted for upload and analysis
pub const ALLOWED_EXTENSIONS: &[&str] = &["pcap", "pcapng", "cap"];

/// Default upload limit (bytes)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

// ============================================
// Report caps
// ============================================

/// Packets always listed in `packet_details` regardless of verdict
pub const DEFAULT_MAX_DETAILS: usize = 100;

/// Hard cap on `packet_details` entries
pub const PACKET_DETAILS_LIMIT: usize = 100;

/// Hard cap on `threat_packets` entries
pub const THREAT_PACKETS_LIMIT: usize = 50;

/// Hard cap on `top_threats` in a quick scan
pub const QUICK_THREATS_LIMIT: usize = 20;

/// Summary truncation for detailed reports
pub const DETAIL_SUMMARY_LEN: usize = 100;

/// Summary truncation for quick scans
pub const QUICK_SUMMARY_LEN: usize = 80;

// ============================================
// Helpers
// ============================================

/// Check whether a file name carries an allowed capture extension
pub fn is_allowed_capture(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Round to two decimals, the precision used in every report
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Truncate to at most `max` characters (not bytes)
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
