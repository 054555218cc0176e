//! vscan-client: HTTP collaborators for the scan pipeline
//!
//! Provides REST implementations of the inventory and tagging capabilities
//! against the vCenter Automation API, and the blob store publisher.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vscan_client::{BlobPublisher, BlobTarget, RestInventoryClient, RestTagClient};
//! use vscan_core::{Orchestrator, OrchestratorArgs};
//! use vscan_inventory::Credentials;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::new("scanner@vsphere.local", "secret");
//! let inventory = RestInventoryClient::connect("https://vcenter.local", &credentials, false).await?;
//! let tags = RestTagClient::new("https://vcenter.local", false)?;
//!
//! let target = BlobTarget::azure(
//!     "storage",
//!     "blob.core.windows.net",
//!     vec!["customer".into(), "installation".into()],
//!     "sv=2019-12-12&sig=abc",
//! )?;
//!
//! let orchestrator = Orchestrator::new(OrchestratorArgs {
//!     inventory: Arc::new(inventory),
//!     tag_client: Arc::new(tags),
//!     credentials,
//!     publisher: Arc::new(BlobPublisher::new(target)),
//!     object_types: vec!["VirtualMachine".into(), "Folder".into()],
//! });
//! let report = orchestrator.run().await?;
//! println!("published {} objects", report.object_count());
//! # Ok(())
//! # }
//! ```

pub mod blob;
pub mod inventory;
pub mod session;
pub mod tags;

pub use blob::{BlobPublisher, BlobTarget};
pub use inventory::RestInventoryClient;
pub use session::RestSession;
pub use tags::RestTagClient;
