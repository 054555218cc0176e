//! Core error types for vscan-core

use thiserror::Error;
use vscan_api::ReportBuildError;
use vscan_inventory::InventoryError;

/// Configuration could not be loaded or is incomplete
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("cannot load configuration file {path}: {source}")]
    Read {
        /// Path that was tried
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// No configuration file was found
    #[error("no configuration file found (tried {0})")]
    NotFound(String),

    /// Configuration is not valid JSON for the expected shape
    #[error("bad configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Required field is missing or empty
    #[error("bad configuration: {0} is required")]
    MissingField(&'static str),

    /// Object type listed more than once
    #[error("bad configuration: object type {0} is listed more than once")]
    DuplicateObjectType(String),
}

/// Report upload failed
#[derive(Error, Debug)]
pub enum PublishError {
    /// Report could not be serialized
    #[error(transparent)]
    Encode(#[from] ReportBuildError),

    /// Destination URL or request could not be built
    #[error("cannot create HTTP request: {0}")]
    Request(String),

    /// Request never produced a response
    #[error("cannot upload report: {0}")]
    Transport(String),

    /// Blob store rejected the upload
    #[error("blob store returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
}

/// Terminal failure of a scan run
#[derive(Error, Debug)]
pub enum RunError {
    /// Inventory session could not be established
    #[error("unable to connect to inventory: {0}")]
    Connection(#[from] InventoryError),

    /// Report could not be serialized
    #[error("unable to build report: {0}")]
    ReportBuild(#[from] ReportBuildError),

    /// Report could not be uploaded
    #[error("unable to publish report: {0}")]
    Publish(PublishError),
}

impl From<PublishError> for RunError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::Encode(e) => RunError::ReportBuild(e),
            other => RunError::Publish(other),
        }
    }
}
