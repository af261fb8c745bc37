//! Data types for records, derived statistics and configuration.

pub mod config;
pub mod record;
pub mod stats;
