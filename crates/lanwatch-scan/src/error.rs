//! Error types for the lanwatch-scan crate.
//!
//! Only failures that abort an operation surface here. Per-address probe
//! failures, collector failures, and enrichment failures degrade to
//! `None` / empty results inside their components and never reach the
//! orchestrator as errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid CIDR '{cidr}': {reason}")]
    InvalidCidr { cidr: String, reason: String },

    #[error("local range detection failed: {0}")]
    RangeDetectionFailed(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
