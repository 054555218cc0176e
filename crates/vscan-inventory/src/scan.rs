//! Per-type inventory scans

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::{ScanError, ScanStage};
use crate::traits::InventoryClient;
use crate::view::ScopedView;

/// Properties requested for most object types
pub const DEFAULT_PROPERTIES: &[&str] = &["name", "tag", "summary"];

/// Properties requested for types without a meaningful summary
pub const NO_SUMMARY_PROPERTIES: &[&str] = &["name", "tag"];

/// Object types whose summary is not retrieved
pub const NO_SUMMARY_TYPES: &[&str] = &["Folder", "Network"];

/// Property selection for `object_type`
#[must_use]
pub fn properties_for(object_type: &str) -> &'static [&'static str] {
    if NO_SUMMARY_TYPES.contains(&object_type) {
        NO_SUMMARY_PROPERTIES
    } else {
        DEFAULT_PROPERTIES
    }
}

/// Inventory scanner
///
/// Runs one property query per object type through a scoped view.
pub struct InventoryScanner {
    client: Arc<dyn InventoryClient>,
}

impl InventoryScanner {
    /// Create a new scanner over an authenticated inventory client
    pub fn new(client: Arc<dyn InventoryClient>) -> Self {
        Self { client }
    }

    /// Scan every object of `object_type`
    ///
    /// The view opened for the scan is destroyed before returning, whether
    /// retrieval succeeded or not.
    ///
    /// # Errors
    /// Returns a [`ScanError`] if the view cannot be created or the
    /// retrieval fails.
    #[instrument(skip(self))]
    pub async fn scan(&self, object_type: &str) -> Result<Vec<Value>, ScanError> {
        let properties = properties_for(object_type);
        debug!(?properties, "scanning resources");

        let view = ScopedView::create(self.client.as_ref(), object_type)
            .await
            .map_err(|cause| ScanError {
                object_type: object_type.to_string(),
                stage: ScanStage::CreateView,
                cause,
            })?;

        let result = view.retrieve(properties).await;
        view.release().await;

        let objects = result.map_err(|cause| ScanError {
            object_type: object_type.to_string(),
            stage: ScanStage::Retrieve,
            cause,
        })?;

        info!(count = objects.len(), "scanned resources");

        Ok(objects)
    }
}
