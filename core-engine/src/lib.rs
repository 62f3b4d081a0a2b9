//! Pulse Sniffer Core
//!
//! Packet capture analysis and tree-ensemble inference.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌─────────────┐
//! │ capture  │──▶│ decode   │──▶│ features   │──▶│ model       │
//! │ pcap/ng  │   │ etherparse│  │ 78 slots   │   │ tree walk   │
//! └──────────┘   └──────────┘   └────────────┘   └──────┬──────┘
//!                                                        ▼
//!                                                 ┌─────────────┐
//!                                                 │ analysis    │
//!                                                 │ reports     │
//!                                                 └─────────────┘
//! ```
//!
//! Flow records (CICIDS2017 columns) skip the capture stage and go straight
//! through [`features::flow::FlowSchema`] into a [`analysis::FlowPredictor`].

pub mod analysis;
pub mod capture;
pub mod constants;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod model;

pub use error::{CoreError, CoreResult};

#[cfg(test)]
pub(crate) mod test_support;
