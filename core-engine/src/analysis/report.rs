//! Report types returned by packet analysis
//!
//! Field names are the JSON wire names used by the REST API and `--json`.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::model::LabelSet;

// ============================================================================
// LABEL MAP
// ============================================================================

/// Label → value pairs that serialize as a JSON object in label order
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap<T> {
    entries: Vec<(String, T)>,
}

impl<T: Copy + Default> LabelMap<T> {
    /// One zeroed entry per label
    pub fn zeroed(labels: &LabelSet) -> Self {
        Self { entries: labels.iter().map(|l| (l.to_string(), T::default())).collect() }
    }
}

impl<T: Copy> LabelMap<T> {
    pub fn get(&self, label: &str) -> Option<T> {
        self.entries.iter().find(|(l, _)| l == label).map(|(_, v)| *v)
    }

    pub fn get_index(&self, index: usize) -> Option<T> {
        self.entries.get(index).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, T)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn map<U>(&self, f: impl Fn(T) -> U) -> LabelMap<U> {
        LabelMap { entries: self.entries.iter().map(|(l, v)| (l.clone(), f(*v))).collect() }
    }
}

impl LabelMap<u64> {
    pub(crate) fn increment(&mut self, index: usize) {
        if let Some((_, count)) = self.entries.get_mut(index) {
            *count += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }
}

impl<T> FromIterator<(String, T)> for LabelMap<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

impl<T: Serialize> Serialize for LabelMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

// ============================================================================
// PER-PACKET
// ============================================================================

/// Verdict for one packet; percentages rounded to 2 decimals
#[derive(Debug, Clone, serde::Serialize)]
pub struct PacketVerdict {
    pub prediction: String,
    pub prediction_id: usize,
    pub confidence: f64,
    pub probabilities: LabelMap<f64>,
    pub summary: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PacketDetail {
    /// One-based packet number
    pub packet_number: usize,
    pub prediction: String,
    pub confidence: f64,
    pub summary: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ThreatPacket {
    #[serde(flatten)]
    pub detail: PacketDetail,
    pub probabilities: LabelMap<f64>,
}

// ============================================================================
// REPORTS
// ============================================================================

#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisSummary {
    pub counts: LabelMap<u64>,
    pub percentages: LabelMap<f64>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisReport {
    pub status: String,
    pub filename: String,
    pub total_packets: usize,
    pub summary: AnalysisSummary,
    pub threats_detected: u64,
    pub threat_packets: Vec<ThreatPacket>,
    pub packet_details: Vec<PacketDetail>,
    pub analysis_time: String,
    pub skipped_packets: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct QuickThreat {
    pub packet: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub confidence: f64,
    pub summary: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct QuickReport {
    pub status: String,
    pub total_packets: usize,
    pub results: LabelMap<u64>,
    pub percentages: LabelMap<f64>,
    pub top_threats: Vec<QuickThreat>,
    pub packets_analyzed: usize,
    pub packets_failed: usize,
    pub timestamp: String,
}

/// count / total * 100 per label; all zero for an empty capture
pub(crate) fn percentages(counts: &LabelMap<u64>, total: usize) -> LabelMap<f64> {
    if total == 0 {
        return counts.map(|_| 0.0);
    }
    counts.map(|c| crate::constants::round2(c as f64 / total as f64 * 100.0))
}
