//! Report publisher trait

use async_trait::async_trait;
use vscan_api::Report;

use crate::error::PublishError;

/// Uploads a finished report
///
/// Implementations make exactly one upload attempt per call.
#[async_trait]
pub trait ReportPublisher: Send + Sync {
    async fn publish(&self, report: &Report) -> Result<(), PublishError>;
}
