//! Utilities
pub mod distributions;
pub mod stats;
