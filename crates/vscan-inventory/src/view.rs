//! Scoped container views

use serde_json::Value;
use tracing::{debug, warn};
use vscan_api::ObjectRef;

use crate::error::InventoryError;
use crate::traits::InventoryClient;

/// Container view that is destroyed when the scan is done with it
///
/// Rust has no async drop, so the view is released through
/// [`ScopedView::release`]. Dropping an unreleased view logs a warning.
pub struct ScopedView<'a> {
    client: &'a dyn InventoryClient,
    view: ObjectRef,
    kinds: Vec<String>,
    released: bool,
}

impl<'a> ScopedView<'a> {
    /// Create a recursive view over the inventory root restricted to `kind`
    ///
    /// # Errors
    /// Returns the collaborator error if the view cannot be created.
    pub async fn create(client: &'a dyn InventoryClient, kind: &str) -> Result<Self, InventoryError> {
        let kinds = vec![kind.to_string()];
        let root = client.root_folder();
        let view = client.create_container_view(&root, &kinds, true).await?;

        debug!(view = %view, kind, "created container view");

        Ok(Self {
            client,
            view,
            kinds,
            released: false,
        })
    }

    /// Retrieve `properties` of every object in the view
    ///
    /// # Errors
    /// Returns the collaborator error if retrieval fails.
    pub async fn retrieve(&self, properties: &[&str]) -> Result<Vec<Value>, InventoryError> {
        self.client.retrieve(&self.view, &self.kinds, properties).await
    }

    /// Destroy the view
    ///
    /// Failure to destroy is logged and otherwise ignored.
    pub async fn release(mut self) {
        self.released = true;
        match self.client.destroy_view(&self.view).await {
            Ok(()) => debug!(view = %self.view, "destroyed container view"),
            Err(e) => warn!(view = %self.view, error = %e, "failed to destroy container view"),
        }
    }
}

impl Drop for ScopedView<'_> {
    fn drop(&mut self) {
        if !self.released {
            warn!(view = %self.view, "container view dropped without being destroyed");
        }
    }
}
