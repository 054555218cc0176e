//! vscan-api: Shared report types
//!
//! Contains the report document, tag attachment and object reference types
//! exchanged between the scanner, the orchestrator and the publisher.

pub mod error;
pub mod object;
pub mod report;

pub use error::ReportBuildError;
pub use object::ObjectRef;
pub use report::{ErrorLog, Report, ScanResult, TagAttachment, build_report};
