//! Features Module - Feature Extraction Engine
//!
//! Packet features (fixed 78-slot layout) and flow features (column list
//! chosen at training time).

pub mod flow;
pub mod layout;
pub mod packet;
pub mod vector;


pub use flow::{FlowRecord, FlowSchema};
pub use layout::{LayoutInfo, FEATURE_COUNT, FEATURE_VERSION};
pub use packet::extract as extract_packet;
pub use vector::{FeatureExtractor, FeatureVector};
