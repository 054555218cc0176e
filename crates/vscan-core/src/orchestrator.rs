//! `Orchestrator`: drives one scan run
//!
//! Scans every configured object type in order, resolves tag attachments
//! once, then builds and publishes the report.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use vscan_api::{ErrorLog, Report, ScanResult, build_report};
use vscan_inventory::{Credentials, InventoryClient, InventoryScanner, TagClient, TagResolver};

use crate::error::RunError;
use crate::publish::ReportPublisher;

/// Arguments for building an `Orchestrator`
pub struct OrchestratorArgs {
    /// Authenticated inventory client
    pub inventory: Arc<dyn InventoryClient>,
    /// Tagging client; logs in on its own session
    pub tag_client: Arc<dyn TagClient>,
    /// Credentials for the tagging session
    pub credentials: Credentials,
    /// Report destination
    pub publisher: Arc<dyn ReportPublisher>,
    /// Object types to scan, in order
    pub object_types: Vec<String>,
}

/// Scan-and-report pipeline
pub struct Orchestrator {
    scanner: InventoryScanner,
    tags: TagResolver,
    publisher: Arc<dyn ReportPublisher>,
    object_types: Vec<String>,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(args: OrchestratorArgs) -> Self {
        Self {
            scanner: InventoryScanner::new(args.inventory),
            tags: TagResolver::new(args.tag_client, args.credentials),
            publisher: args.publisher,
            object_types: args.object_types,
        }
    }

    /// Scan every configured object type
    ///
    /// Every type ends up in exactly one of the two maps. A failed scan is
    /// recorded with its message and the remaining types are still scanned.
    #[instrument(skip(self))]
    pub async fn scan_all(&self) -> (ScanResult, ErrorLog) {
        let mut scanned = ScanResult::new();
        let mut errors = ErrorLog::new();
        let mut seen = HashSet::new();

        for object_type in &self.object_types {
            if !seen.insert(object_type.as_str()) {
                debug!(object_type = %object_type, "object type already scanned, skipping");
                continue;
            }

            match self.scanner.scan(object_type).await {
                Ok(objects) => {
                    scanned.insert(object_type.clone(), objects);
                }
                Err(e) => {
                    warn!(
                        object_type = %object_type,
                        stage = %e.stage,
                        error = %e,
                        "unable to scan object"
                    );
                    errors.insert(object_type.clone(), e.to_string());
                }
            }
        }

        (scanned, errors)
    }

    /// Run the pipeline and return the published report
    ///
    /// # Errors
    /// Returns an error if the report cannot be serialized or uploaded.
    /// Per-type scan failures and tag lookup failures are not errors.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<Report, RunError> {
        info!(types = self.object_types.len(), "starting scan");

        let (scanned, errors) = self.scan_all().await;
        let tags = self.tags.resolve().await;

        let report = build_report(scanned, errors, tags);

        info!(
            objects = report.object_count(),
            failed_types = report.errors.len(),
            tags = report.tags.len(),
            "report built"
        );

        self.publisher.publish(&report).await?;

        info!("report published");

        Ok(report)
    }
}
