//! Tag attachment resolution

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use vscan_api::TagAttachment;

use crate::error::TagResolutionError;
use crate::traits::{Credentials, TagClient};

/// Resolves every tag attachment in the inventory
///
/// Failures never abort the run: a failed login or tag listing yields no
/// attachments, and a failed lookup for one tag skips only that tag.
pub struct TagResolver {
    client: Arc<dyn TagClient>,
    credentials: Credentials,
}

impl TagResolver {
    /// Create a resolver that logs in with `credentials`
    pub fn new(client: Arc<dyn TagClient>, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Resolve all tag attachments
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> Vec<TagAttachment> {
        if let Err(e) = self.client.login(&self.credentials).await {
            warn!(error = %TagResolutionError::Login(e), "skipping tag resolution");
            return Vec::new();
        }

        let tag_ids = match self.client.list_tags().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %TagResolutionError::ListTags(e), "skipping tag resolution");
                return Vec::new();
            }
        };

        debug!(count = tag_ids.len(), "listed tags");

        let mut categories: HashMap<String, String> = HashMap::new();
        let mut attachments = Vec::new();

        for tag_id in &tag_ids {
            match self.resolve_tag(tag_id, &mut categories).await {
                Ok(found) => attachments.extend(found),
                Err(e) => warn!(error = %e, "skipping tag"),
            }
        }

        info!(
            tags = tag_ids.len(),
            attachments = attachments.len(),
            "resolved tag attachments"
        );

        attachments
    }

    /// Resolve the attachments of a single tag
    async fn resolve_tag(
        &self,
        tag_id: &str,
        categories: &mut HashMap<String, String>,
    ) -> Result<Vec<TagAttachment>, TagResolutionError> {
        let tag = self
            .client
            .get_tag(tag_id)
            .await
            .map_err(|cause| TagResolutionError::Tag {
                tag_id: tag_id.to_string(),
                cause,
            })?;

        let category_name = match categories.get(&tag.category_id) {
            Some(name) => name.clone(),
            None => {
                let category = self
                    .client
                    .get_category(&tag.category_id)
                    .await
                    .map_err(|cause| TagResolutionError::Category {
                        tag_id: tag_id.to_string(),
                        category_id: tag.category_id.clone(),
                        cause,
                    })?;
                categories.insert(tag.category_id.clone(), category.name.clone());
                category.name
            }
        };

        let objects = self
            .client
            .list_attached_objects(tag_id)
            .await
            .map_err(|cause| TagResolutionError::AttachedObjects {
                tag_id: tag_id.to_string(),
                cause,
            })?;

        Ok(objects
            .iter()
            .map(|object| TagAttachment::new(object, category_name.as_str(), tag.name.as_str()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use vscan_api::ObjectRef;

    use super::*;
    use crate::error::InventoryError;
    use crate::traits::{Category, Tag};

    #[derive(Default)]
    struct MockTags {
        fail_login: bool,
        fail_list: bool,
        tags: Vec<Tag>,
        categories: Vec<Category>,
        attached: HashMap<String, Vec<ObjectRef>>,
        broken_tags: Vec<String>,
        unknown_tags: Vec<String>,
        category_lookups: Mutex<u32>,
        logins: Mutex<Vec<String>>,
    }

    impl MockTags {
        fn with_tag(mut self, id: &str, name: &str, category_id: &str, objects: &[(&str, &str)]) -> Self {
            self.tags.push(Tag {
                id: id.to_string(),
                name: name.to_string(),
                category_id: category_id.to_string(),
                description: String::new(),
            });
            self.attached.insert(
                id.to_string(),
                objects.iter().map(|(k, v)| ObjectRef::new(*k, *v)).collect(),
            );
            self
        }

        fn with_category(mut self, id: &str, name: &str) -> Self {
            self.categories.push(Category {
                id: id.to_string(),
                name: name.to_string(),
                description: String::new(),
            });
            self
        }
    }

    #[async_trait]
    impl TagClient for MockTags {
        async fn login(&self, credentials: &Credentials) -> Result<(), InventoryError> {
            self.logins.lock().unwrap().push(credentials.username.clone());
            if self.fail_login {
                return Err(InventoryError::ConnectionFailed("401".to_string()));
            }
            Ok(())
        }

        async fn list_tags(&self) -> Result<Vec<String>, InventoryError> {
            if self.fail_list {
                return Err(InventoryError::Transport("reset by peer".to_string()));
            }
            Ok(self
                .tags
                .iter()
                .map(|t| t.id.clone())
                .chain(self.unknown_tags.iter().cloned())
                .collect())
        }

        async fn get_tag(&self, tag_id: &str) -> Result<Tag, InventoryError> {
            self.tags
                .iter()
                .find(|t| t.id == tag_id)
                .cloned()
                .ok_or_else(|| InventoryError::Api {
                    status: 404,
                    message: tag_id.to_string(),
                })
        }

        async fn get_category(&self, category_id: &str) -> Result<Category, InventoryError> {
            *self.category_lookups.lock().unwrap() += 1;
            self.categories
                .iter()
                .find(|c| c.id == category_id)
                .cloned()
                .ok_or_else(|| InventoryError::Api {
                    status: 404,
                    message: category_id.to_string(),
                })
        }

        async fn list_attached_objects(&self, tag_id: &str) -> Result<Vec<ObjectRef>, InventoryError> {
            if self.broken_tags.iter().any(|t| t == tag_id) {
                return Err(InventoryError::Transport("timeout".to_string()));
            }
            Ok(self.attached.get(tag_id).cloned().unwrap_or_default())
        }
    }

    fn resolver(mock: MockTags) -> (Arc<MockTags>, TagResolver) {
        let mock = Arc::new(mock);
        let resolver = TagResolver::new(mock.clone(), Credentials::new("scanner", "secret"));
        (mock, resolver)
    }

    #[tokio::test]
    async fn test_one_attachment_per_object() {
        let (mock, resolver) = resolver(
            MockTags::default()
                .with_category("cat-env", "env")
                .with_tag("tag-prod", "prod", "cat-env", &[
                    ("VirtualMachine", "vm-101"),
                    ("HostSystem", "host-7"),
                ]),
        );

        let attachments = resolver.resolve().await;

        assert_eq!(*mock.logins.lock().unwrap(), vec!["scanner".to_string()]);
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].res_type, "VirtualMachine");
        assert_eq!(attachments[0].res_value, "vm-101");
        assert_eq!(attachments[0].tag_name, "env");
        assert_eq!(attachments[0].tag_value, "prod");
        assert_eq!(attachments[1].res_value, "host-7");
    }

    #[tokio::test]
    async fn test_unattached_tags_contribute_nothing() {
        let (_, resolver) = resolver(
            MockTags::default()
                .with_category("cat-env", "env")
                .with_tag("tag-prod", "prod", "cat-env", &[])
                .with_tag("tag-dev", "dev", "cat-env", &[]),
        );

        assert!(resolver.resolve().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_tag_is_skipped() {
        let mut mock = MockTags::default()
            .with_category("cat-env", "env")
            .with_tag("tag-a", "a", "cat-env", &[("VirtualMachine", "vm-1")])
            .with_tag("tag-b", "b", "cat-env", &[("VirtualMachine", "vm-2")])
            .with_tag("tag-c", "c", "cat-missing", &[("VirtualMachine", "vm-3")])
            .with_tag("tag-d", "d", "cat-env", &[("VirtualMachine", "vm-4")]);
        mock.broken_tags.push("tag-b".to_string());
        let (_, resolver) = resolver(mock);

        let attachments = resolver.resolve().await;

        let values: Vec<&str> = attachments.iter().map(|a| a.res_value.as_str()).collect();
        assert_eq!(values, vec!["vm-1", "vm-4"]);
    }

    #[tokio::test]
    async fn test_tag_lookup_failure_is_skipped() {
        let mut mock = MockTags::default()
            .with_category("cat-env", "env")
            .with_tag("tag-prod", "prod", "cat-env", &[("VirtualMachine", "vm-1")]);
        mock.unknown_tags.push("tag-deleted".to_string());
        let (mock, resolver) = resolver(mock);

        let attachments = resolver.resolve().await;

        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].tag_value, "prod");
        assert_eq!(*mock.category_lookups.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_category_lookup_cached() {
        let (mock, resolver) = resolver(
            MockTags::default()
                .with_category("cat-env", "env")
                .with_tag("tag-prod", "prod", "cat-env", &[("VirtualMachine", "vm-1")])
                .with_tag("tag-dev", "dev", "cat-env", &[("VirtualMachine", "vm-2")]),
        );

        assert_eq!(resolver.resolve().await.len(), 2);
        assert_eq!(*mock.category_lookups.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_login_failure_yields_nothing() {
        let mock = MockTags {
            fail_login: true,
            ..Default::default()
        }
        .with_category("cat-env", "env")
        .with_tag("tag-prod", "prod", "cat-env", &[("VirtualMachine", "vm-1")]);
        let (_, resolver) = resolver(mock);

        assert!(resolver.resolve().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_failure_yields_nothing() {
        let (_, resolver) = resolver(MockTags {
            fail_list: true,
            ..Default::default()
        });

        assert!(resolver.resolve().await.is_empty());
    }
}
