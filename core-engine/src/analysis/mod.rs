//! Analysis Module - capture and flow classification

pub mod flows;
pub mod packet;
pub mod report;


pub use flows::{FlowMetadata, FlowPrediction, FlowPredictor};
pub use packet::PacketAnalyzer;
pub use report::{
    AnalysisReport, AnalysisSummary, LabelMap, PacketDetail, PacketVerdict, QuickReport, QuickThreat,
    ThreatPacket,
};
