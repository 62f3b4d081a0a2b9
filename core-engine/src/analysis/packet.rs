//! Packet Analyzer
//!
//! Scores every packet of a capture with the packet model and folds the
//! verdicts into an `AnalysisReport` or a lighter `QuickReport`.

use std::sync::Arc;

use chrono::Utc;

use super::report::{
    percentages, AnalysisReport, AnalysisSummary, LabelMap, PacketDetail, PacketVerdict, QuickReport,
    QuickThreat, ThreatPacket,
};
use crate::capture::{decode, Capture, DecodedPacket};
use crate::constants::{
    round2, truncate_chars, DETAIL_SUMMARY_LEN, PACKET_DETAILS_LIMIT, QUICK_SUMMARY_LEN, QUICK_THREATS_LIMIT,
    THREAT_PACKETS_LIMIT,
};
use crate::error::{CoreError, CoreResult};
use crate::features::{extract_packet, layout, FEATURE_COUNT};
use crate::model::{Classifier, LabelSet, LoadedModel};

pub struct PacketAnalyzer {
    model: Arc<LoadedModel>,
    labels: LabelSet,
}

impl PacketAnalyzer {
    /// Pair a model with its class names
    pub fn new(model: Arc<LoadedModel>, labels: LabelSet) -> CoreResult<Self> {
        if model.num_features() != FEATURE_COUNT {
            return Err(CoreError::FeatureMismatch { expected: FEATURE_COUNT, actual: model.num_features() });
        }
        let names = &model.ensemble().feature_names;
        if !names.is_empty() && *names != layout::feature_names() {
            log::warn!("Model feature names differ from packet layout v{}", layout::FEATURE_VERSION);
        }
        if model.num_classes() > labels.len() {
            return Err(CoreError::Model(format!(
                "model predicts {} classes but only {} labels are known",
                model.num_classes(),
                labels.len()
            )));
        }
        Ok(Self { model, labels })
    }

    /// Labels from the model document, else the packet attack set
    pub fn from_model(model: Arc<LoadedModel>) -> CoreResult<Self> {
        let labels = if model.class_labels().is_empty() {
            LabelSet::packet_attacks()
        } else {
            LabelSet::new(model.class_labels().to_vec())
        };
        Self::new(model, labels)
    }

    pub fn model(&self) -> &LoadedModel {
        &self.model
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    // ========================================================================
    // SINGLE PACKET
    // ========================================================================

    pub fn analyze_packet(&self, packet: &DecodedPacket) -> CoreResult<PacketVerdict> {
        let features = extract_packet(packet);
        let result = self.model.predict_one(features.as_slice())?;

        let probabilities = result
            .probabilities
            .iter()
            .enumerate()
            .map(|(i, p)| (self.labels.name(i), round2(p * 100.0)))
            .collect();

        Ok(PacketVerdict {
            prediction: self.labels.name(result.class_id),
            prediction_id: result.class_id,
            confidence: round2(result.confidence * 100.0),
            probabilities,
            summary: packet.summary.clone(),
        })
    }

    fn verdicts<'a>(&'a self, capture: &'a Capture) -> impl Iterator<Item = (usize, CoreResult<PacketVerdict>)> + 'a {
        capture.packets.iter().enumerate().map(move |(i, raw)| {
            let packet = decode(raw);
            let verdict = self.analyze_packet(&packet);
            if let Err(e) = &verdict {
                log::debug!("Packet {} skipped: {}", i + 1, e);
            }
            (i, verdict)
        })
    }

    // ========================================================================
    // FULL REPORT
    // ========================================================================

    /// Full report. Packets with index < `max_details` and every threat are
    /// listed in `packet_details`, up to the detail cap.
    pub fn analyze(&self, capture: &Capture, filename: &str, max_details: usize) -> AnalysisReport {
        let mut counts = LabelMap::<u64>::zeroed(&self.labels);
        let mut packet_details = Vec::new();
        let mut threat_packets = Vec::new();
        let mut skipped = 0;

        for (i, verdict) in self.verdicts(capture) {
            let verdict = match verdict {
                Ok(v) => v,
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };

            counts.increment(verdict.prediction_id);
            let is_threat = !self.labels.is_benign(verdict.prediction_id);

            if i < max_details || is_threat {
                let detail = PacketDetail {
                    packet_number: i + 1,
                    prediction: verdict.prediction,
                    confidence: verdict.confidence,
                    summary: truncate_chars(&verdict.summary, DETAIL_SUMMARY_LEN),
                };

                if is_threat && threat_packets.len() < THREAT_PACKETS_LIMIT {
                    threat_packets.push(ThreatPacket { detail: detail.clone(), probabilities: verdict.probabilities });
                }
                if packet_details.len() < PACKET_DETAILS_LIMIT {
                    packet_details.push(detail);
                }
            }
        }

        let total = capture.len();
        let threats_detected: u64 = counts.iter().skip(1).map(|(_, c)| c).sum();
        log::info!(
            "Analyzed {}: {} packets, {} threats, {} skipped",
            filename,
            total,
            threats_detected,
            skipped
        );

        AnalysisReport {
            status: "success".to_string(),
            filename: filename.to_string(),
            total_packets: total,
            summary: AnalysisSummary { percentages: percentages(&counts, total), counts },
            threats_detected,
            threat_packets,
            packet_details,
            analysis_time: Utc::now().to_rfc3339(),
            skipped_packets: skipped,
        }
    }

    // ========================================================================
    // QUICK SCAN
    // ========================================================================

    pub fn quick_scan(&self, capture: &Capture) -> QuickReport {
        let mut results = LabelMap::<u64>::zeroed(&self.labels);
        let mut top_threats = Vec::new();
        let mut analyzed = 0;
        let mut failed = 0;

        for (i, verdict) in self.verdicts(capture) {
            match verdict {
                Ok(v) => {
                    results.increment(v.prediction_id);
                    analyzed += 1;

                    if !self.labels.is_benign(v.prediction_id) && top_threats.len() < QUICK_THREATS_LIMIT {
                        top_threats.push(QuickThreat {
                            packet: i + 1,
                            kind: v.prediction,
                            confidence: v.confidence,
                            summary: truncate_chars(&v.summary, QUICK_SUMMARY_LEN),
                        });
                    }
                }
                Err(_) => failed += 1,
            }
        }

        log::info!("Quick scan complete: {} analyzed, {} failed", analyzed, failed);

        let total = capture.len();
        QuickReport {
            status: "success".to_string(),
            total_packets: total,
            percentages: percentages(&results, total),
            results,
            top_threats,
            packets_analyzed: analyzed,
            packets_failed: failed,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
