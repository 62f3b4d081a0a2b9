//! Class label sets

use serde::{Deserialize, Serialize};

/// Packet-level attack classes
const PACKET_ATTACKS: [&str; 5] = ["Normal", "DDoS", "Port Scan", "SQL Injection", "Malware"];

/// CICIDS2017 labels in LabelEncoder (sorted) order
const CICIDS2017: [&str; 27] = [
    "BENIGN",
    "Botnet",
    "Botnet - Attempted",
    "DDoS",
    "DoS GoldenEye",
    "DoS GoldenEye - Attempted",
    "DoS Hulk",
    "DoS Hulk - Attempted",
    "DoS Slowhttptest",
    "DoS Slowhttptest - Attempted",
    "DoS Slowloris",
    "DoS Slowloris - Attempted",
    "FTP-Patator",
    "FTP-Patator - Attempted",
    "Heartbleed",
    "Infiltration",
    "Infiltration - Attempted",
    "Infiltration - Portscan",
    "Portscan",
    "SSH-Patator",
    "SSH-Patator - Attempted",
    "Web Attack - Brute Force",
    "Web Attack - Brute Force - Attempted",
    "Web Attack - SQL Injection",
    "Web Attack - SQL Injection - Attempted",
    "Web Attack - XSS",
    "Web Attack - XSS - Attempted",
];

/// Ordered class names; index = class id. Index 0 is the benign class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn packet_attacks() -> Self {
        Self::from_static(&PACKET_ATTACKS)
    }

    pub fn cicids2017() -> Self {
        Self::from_static(&CICIDS2017)
    }

    fn from_static(names: &[&str]) -> Self {
        Self { names: names.iter().map(|s| s.to_string()).collect() }
    }

    /// Label for a class id, or the id itself when out of range
    pub fn name(&self, id: usize) -> String {
        self.names.get(id).cloned().unwrap_or_else(|| id.to_string())
    }

    pub fn get(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn benign(&self) -> Option<&str> {
        self.get(0)
    }

    pub fn is_benign(&self, id: usize) -> bool {
        id == 0
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
