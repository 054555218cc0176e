//! vscan-core: scan-and-report pipeline
//!
//! Implements the `Orchestrator` that scans each configured object type,
//! resolves tag attachments, builds the report and hands it to a publisher.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod publish;

pub use config::{DEFAULT_BLOB_HOST, ScannerConfig};
pub use error::{ConfigError, PublishError, RunError};
pub use orchestrator::{Orchestrator, OrchestratorArgs};
pub use publish::ReportPublisher;
