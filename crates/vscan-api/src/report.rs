//! Report document produced by a scan run

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ReportBuildError;
use crate::object::ObjectRef;

/// Scanned objects keyed by inventory type name
///
/// A type missing from the map is a type whose scan failed.
pub type ScanResult = BTreeMap<String, Vec<Value>>;

/// Scan failure messages keyed by inventory type name
pub type ErrorLog = BTreeMap<String, String>;

/// One tag attached to one inventory object
///
/// `tag_name` is the category name and `tag_value` the tag's own name, so a
/// tag `prod` in category `env` attached to `vm-101` reads as
/// `env=prod` on `VirtualMachine:vm-101`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagAttachment {
    /// Inventory type of the tagged object
    pub res_type: String,
    /// Identifier of the tagged object
    pub res_value: String,
    /// Category name
    pub tag_name: String,
    /// Tag name within the category
    pub tag_value: String,
}

impl TagAttachment {
    /// Build an attachment for `object` carrying `category`/`tag`
    pub fn new(object: &ObjectRef, category: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            res_type: object.kind.clone(),
            res_value: object.value.clone(),
            tag_name: category.into(),
            tag_value: tag.into(),
        }
    }
}

/// Complete scan report
///
/// All three fields are always serialized, empty ones as `{}` or `[]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Per-type scan failures
    pub errors: ErrorLog,
    /// Every tag attachment found in the inventory
    pub tags: Vec<TagAttachment>,
    /// Per-type scanned objects
    pub scanned_objects: ScanResult,
}

impl Report {
    /// Serialize the report to its JSON wire form
    ///
    /// # Errors
    /// Returns an error if any scanned object cannot be encoded.
    pub fn to_json_vec(&self) -> Result<Vec<u8>, ReportBuildError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Number of scanned objects across all types
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.scanned_objects.values().map(Vec::len).sum()
    }
}

/// Assemble a report from the accumulated scan state
#[must_use]
pub fn build_report(
    scanned_objects: ScanResult,
    errors: ErrorLog,
    tags: Vec<TagAttachment>,
) -> Report {
    Report {
        errors,
        tags,
        scanned_objects,
    }
}
