//! vscan-inventory: inventory scanning and tag resolution
//!
//! Defines the capability traits the scanner needs from a virtualization
//! inventory, the per-type property selection policy, and the tag resolver
//! that flattens tag/category attachments into report tuples.

pub mod error;
pub mod scan;
pub mod tags;
pub mod traits;
pub mod view;

pub use error::{InventoryError, ScanError, ScanStage, TagResolutionError};
pub use scan::{InventoryScanner, properties_for};
pub use tags::TagResolver;
pub use traits::{Category, Credentials, InventoryClient, Tag, TagClient};
pub use view::ScopedView;
