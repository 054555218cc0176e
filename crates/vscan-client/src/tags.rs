//! Tagging client over the vCenter REST API

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use vscan_api::ObjectRef;
use vscan_inventory::{Category, Credentials, InventoryError, Tag, TagClient};

use crate::session::RestSession;

/// Object reference as returned by tag association calls
#[derive(Deserialize)]
struct DynamicId {
    #[serde(rename = "type")]
    kind: String,
    id: String,
}

/// Tag client with its own REST session
pub struct RestTagClient {
    session: RestSession,
}

impl RestTagClient {
    /// Create a tag client; call [`TagClient::login`] before use
    ///
    /// # Errors
    /// Returns an error if the URL is invalid.
    pub fn new(url: impl AsRef<str>, insecure: bool) -> Result<Self, InventoryError> {
        Ok(Self::with_session(RestSession::new(url, insecure)?))
    }

    /// Wrap an existing session
    pub fn with_session(session: RestSession) -> Self {
        Self { session }
    }

    /// Close the tagging session
    pub async fn logout(&self) {
        self.session.logout().await;
    }
}

#[async_trait]
impl TagClient for RestTagClient {
    async fn login(&self, credentials: &Credentials) -> Result<(), InventoryError> {
        self.session.login(credentials).await
    }

    #[instrument(skip(self))]
    async fn list_tags(&self) -> Result<Vec<String>, InventoryError> {
        let url = self.session.url(&["api", "cis", "tagging", "tag"], None)?;
        self.session.get(url).await
    }

    #[instrument(skip(self))]
    async fn get_tag(&self, tag_id: &str) -> Result<Tag, InventoryError> {
        let url = self
            .session
            .url(&["api", "cis", "tagging", "tag", tag_id], None)?;
        self.session.get(url).await
    }

    #[instrument(skip(self))]
    async fn get_category(&self, category_id: &str) -> Result<Category, InventoryError> {
        let url = self
            .session
            .url(&["api", "cis", "tagging", "category", category_id], None)?;
        self.session.get(url).await
    }

    #[instrument(skip(self))]
    async fn list_attached_objects(&self, tag_id: &str) -> Result<Vec<ObjectRef>, InventoryError> {
        let url = self.session.url(
            &["api", "cis", "tagging", "tag-association", tag_id],
            Some("list-attached-objects"),
        )?;
        let ids: Vec<DynamicId> = self.session.post(url, &json!({})).await?;

        Ok(ids
            .into_iter()
            .map(|id| ObjectRef::new(id.kind, id.id))
            .collect())
    }
}
