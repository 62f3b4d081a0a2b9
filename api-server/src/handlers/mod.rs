//! HTTP handlers

pub mod analyze;
pub mod flows;
pub mod health;
pub mod info;
pub mod stats;
pub mod upload;
