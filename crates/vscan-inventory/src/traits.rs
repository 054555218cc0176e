//! Inventory and tagging capability traits

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vscan_api::ObjectRef;

use crate::error::InventoryError;

/// Username/password pair used to open inventory and tagging sessions
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Tag as exposed by the tagging service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub category_id: String,
    #[serde(default)]
    pub description: String,
}

/// Tag category as exposed by the tagging service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Property retrieval against an authenticated inventory session
///
/// Views are server-side handles and must be destroyed by the caller; use
/// [`crate::view::ScopedView`] rather than calling these directly.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Root folder of the inventory
    fn root_folder(&self) -> ObjectRef;

    /// Create a container view over `container` restricted to `kinds`
    async fn create_container_view(
        &self,
        container: &ObjectRef,
        kinds: &[String],
        recursive: bool,
    ) -> Result<ObjectRef, InventoryError>;

    /// Retrieve `properties` of every object of `kinds` in the view
    async fn retrieve(
        &self,
        view: &ObjectRef,
        kinds: &[String],
        properties: &[&str],
    ) -> Result<Vec<Value>, InventoryError>;

    /// Destroy a view created by [`InventoryClient::create_container_view`]
    async fn destroy_view(&self, view: &ObjectRef) -> Result<(), InventoryError>;
}

/// Tag and category lookups against the tagging service
///
/// Implementations hold their own session, separate from the inventory one.
#[async_trait]
pub trait TagClient: Send + Sync {
    /// Open the tagging session
    async fn login(&self, credentials: &Credentials) -> Result<(), InventoryError>;

    /// Identifiers of every tag known to the service
    async fn list_tags(&self) -> Result<Vec<String>, InventoryError>;

    /// Tag details
    async fn get_tag(&self, tag_id: &str) -> Result<Tag, InventoryError>;

    /// Category details
    async fn get_category(&self, category_id: &str) -> Result<Category, InventoryError>;

    /// Objects the tag is attached to
    async fn list_attached_objects(&self, tag_id: &str) -> Result<Vec<ObjectRef>, InventoryError>;
}
