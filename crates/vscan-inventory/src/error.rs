//! Error types for vscan-inventory

use std::fmt;

use thiserror::Error;

/// Errors reported by inventory and tag collaborators
#[derive(Error, Debug, Clone)]
pub enum InventoryError {
    /// Session could not be established
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Call made before a session was established
    #[error("not logged in")]
    NotLoggedIn,

    /// Transport-level failure talking to the service
    #[error("{0}")]
    Transport(String),

    /// Service answered with an error status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the service
        message: String,
    },

    /// Object type has no counterpart in the inventory service
    #[error("unsupported object type: {0}")]
    UnsupportedType(String),

    /// Requested property is not known for the object type
    #[error("unknown property '{property}' for {object_type}")]
    UnknownProperty {
        /// Inventory type being queried
        object_type: String,
        /// Offending property name
        property: String,
    },

    /// View handle does not refer to a live view
    #[error("unknown view: {0}")]
    UnknownView(String),

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    ParseError(String),
}

/// Step of a scan that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    /// Creating the scoped container view
    CreateView,
    /// Retrieving properties through the view
    Retrieve,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStage::CreateView => write!(f, "unable to create container view"),
            ScanStage::Retrieve => write!(f, "unable to retrieve objects"),
        }
    }
}

/// Scan of a single object type failed
///
/// Displays as the underlying cause so the report's error log carries the
/// collaborator's own message.
#[derive(Error, Debug, Clone)]
#[error("{cause}")]
pub struct ScanError {
    /// Object type being scanned
    pub object_type: String,
    /// Step that failed
    pub stage: ScanStage,
    /// Collaborator error
    pub cause: InventoryError,
}

/// Tag resolution step failed
#[derive(Error, Debug, Clone)]
pub enum TagResolutionError {
    /// Tag session could not be opened
    #[error("unable to log in to tagging service: {0}")]
    Login(InventoryError),

    /// Tag enumeration failed
    #[error("unable to list tags: {0}")]
    ListTags(InventoryError),

    /// Tag details lookup failed
    #[error("unable to get tag {tag_id}: {cause}")]
    Tag {
        /// Tag identifier
        tag_id: String,
        /// Collaborator error
        cause: InventoryError,
    },

    /// Category lookup failed
    #[error("unable to get category {category_id} of tag {tag_id}: {cause}")]
    Category {
        /// Tag identifier
        tag_id: String,
        /// Category identifier
        category_id: String,
        /// Collaborator error
        cause: InventoryError,
    },

    /// Attached objects lookup failed
    #[error("unable to get attached objects on tag {tag_id}: {cause}")]
    AttachedObjects {
        /// Tag identifier
        tag_id: String,
        /// Collaborator error
        cause: InventoryError,
    },
}
