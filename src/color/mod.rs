//! Color conversion and statistics module
//!
//! This module handles sRGB <-> Lab conversion and the per-channel
//! statistics the transfer stages are driven by.

pub mod conversion;
pub mod statistics;

pub use conversion::ColorConverter;
pub use statistics::{ChannelStats, LabStats};
