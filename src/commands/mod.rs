//! Command implementations for the sleeper-sync CLI

pub mod plan;
pub mod status;
pub mod sync;
