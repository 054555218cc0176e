//! Error types for vscan-api

use thiserror::Error;

/// Errors raised while turning a report into its wire form
#[derive(Error, Debug)]
pub enum ReportBuildError {
    /// Report contained data that could not be encoded
    #[error("bad data in report: {0}")]
    Encode(#[from] serde_json::Error),
}
