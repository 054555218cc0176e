//! Inventory object references

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable reference to a managed inventory object
///
/// `kind` is the inventory type name (`VirtualMachine`, `Folder`, ...) and
/// `value` the object's identifier within the inventory (`vm-101`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl ObjectRef {
    /// Create a new object reference
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}
