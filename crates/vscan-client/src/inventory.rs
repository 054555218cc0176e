//! Inventory client over the vCenter REST API

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use vscan_api::ObjectRef;
use vscan_inventory::{Credentials, InventoryClient, InventoryError};

use crate::session::RestSession;

/// Managed object type of the view handles this client hands out
const VIEW_KIND: &str = "ContainerView";

/// Managed object id of the inventory root folder
const ROOT_FOLDER: &str = "group-d1";

/// Whether the server refused a listing for returning too many results
fn is_result_cap(err: &InventoryError) -> bool {
    matches!(err, InventoryError::Api { message, .. }
        if message.to_ascii_lowercase().contains("unable_to_allocate_resource"))
}

/// One entry of a batch tag association response
#[derive(Deserialize)]
struct ObjectTags {
    object_id: ObjectId,
    #[serde(default)]
    tag_ids: Vec<String>,
}

#[derive(Deserialize)]
struct ObjectId {
    id: String,
}

/// REST collection path and summary id field for an object type
fn collection_for(kind: &str) -> Option<(&'static str, &'static str)> {
    match kind {
        "VirtualMachine" => Some(("vm", "vm")),
        "HostSystem" => Some(("host", "host")),
        "Folder" => Some(("folder", "folder")),
        "Network" => Some(("network", "network")),
        "Datastore" => Some(("datastore", "datastore")),
        "ClusterComputeResource" => Some(("cluster", "cluster")),
        "Datacenter" => Some(("datacenter", "datacenter")),
        "ResourcePool" => Some(("resource-pool", "resource_pool")),
        _ => None,
    }
}

/// Inventory client backed by the vCenter Automation REST API
///
/// Container views are kept client side: creating one validates the
/// requested types and registers a handle, retrieving lists the matching
/// REST collections, destroying drops the handle.
pub struct RestInventoryClient {
    session: RestSession,
    views: Mutex<HashMap<String, Vec<String>>>,
    next_view: AtomicU64,
}

impl RestInventoryClient {
    /// Wrap an existing session
    pub fn new(session: RestSession) -> Self {
        Self {
            session,
            views: Mutex::new(HashMap::new()),
            next_view: AtomicU64::new(1),
        }
    }

    /// Open an authenticated inventory session
    ///
    /// # Errors
    /// Returns `ConnectionFailed` if the URL is invalid or login fails.
    pub async fn connect(
        url: impl AsRef<str>,
        credentials: &Credentials,
        insecure: bool,
    ) -> Result<Self, InventoryError> {
        let session = RestSession::new(url, insecure)?;
        session.login(credentials).await?;
        Ok(Self::new(session))
    }

    /// Close the inventory session
    pub async fn logout(&self) {
        self.session.logout().await;
    }

    /// Identifiers of the tags attached to one object
    async fn attached_tags(&self, object: &ObjectRef) -> Result<Vec<String>, InventoryError> {
        let url = self.session.url(
            &["api", "cis", "tagging", "tag-association"],
            Some("list-attached-tags"),
        )?;
        let body = json!({ "object_id": { "type": object.kind, "id": object.value } });
        self.session.post(url, &body).await
    }

    /// Tag identifiers for many objects in one request
    async fn attached_tags_batch(
        &self,
        objects: &[ObjectRef],
    ) -> Result<HashMap<String, Vec<String>>, InventoryError> {
        let url = self.session.url(
            &["api", "cis", "tagging", "tag-association"],
            Some("list-attached-tags-on-objects"),
        )?;
        let ids: Vec<Value> = objects
            .iter()
            .map(|o| json!({ "type": o.kind, "id": o.value }))
            .collect();
        let body = json!({ "object_ids": ids });
        let entries: Vec<ObjectTags> = self.session.post(url, &body).await?;

        Ok(entries
            .into_iter()
            .map(|entry| (entry.object_id.id, entry.tag_ids))
            .collect())
    }

    /// Tags for every object of one kind
    ///
    /// Tries one batch request first. If that fails, each object is looked up
    /// on its own and an object whose lookup fails gets `null`.
    async fn tags_for(&self, objects: &[ObjectRef]) -> HashMap<String, Value> {
        match self.attached_tags_batch(objects).await {
            Ok(mut batch) => {
                return objects
                    .iter()
                    .map(|o| {
                        let tags = batch.remove(&o.value).unwrap_or_default();
                        (o.value.clone(), json!(tags))
                    })
                    .collect();
            }
            Err(e) => {
                warn!(
                    error = %e,
                    objects = objects.len(),
                    "batch tag lookup failed, looking up objects one by one"
                );
            }
        }

        let mut tags = HashMap::with_capacity(objects.len());
        for object in objects {
            let value = match self.attached_tags(object).await {
                Ok(ids) => json!(ids),
                Err(e) => {
                    warn!(object = %object, error = %e, "unable to list attached tags");
                    Value::Null
                }
            };
            tags.insert(object.value.clone(), value);
        }
        tags
    }

    /// Object summaries of one collection
    ///
    /// Listings above the server's result cap are split per datacenter and
    /// merged.
    async fn list_summaries(
        &self,
        kind: &str,
        collection: &str,
        id_field: &str,
    ) -> Result<Vec<Map<String, Value>>, InventoryError> {
        let url = self.session.url(&["api", "vcenter", collection], None)?;
        let err = match self.session.get(url).await {
            Ok(summaries) => return Ok(summaries),
            Err(e) if kind != "Datacenter" && is_result_cap(&e) => e,
            Err(e) => return Err(e),
        };

        debug!(kind, error = %err, "listing exceeds result cap, splitting by datacenter");

        let url = self.session.url(&["api", "vcenter", "datacenter"], None)?;
        let datacenters: Vec<Map<String, Value>> = self.session.get(url).await?;

        let mut seen = HashSet::new();
        let mut summaries = Vec::new();
        for datacenter in &datacenters {
            let Some(datacenter) = datacenter.get("datacenter").and_then(Value::as_str) else {
                continue;
            };

            let mut url = self.session.url(&["api", "vcenter", collection], None)?;
            url.query_pairs_mut().append_pair("datacenters", datacenter);
            let part: Vec<Map<String, Value>> = self.session.get(url).await?;

            for summary in part {
                let id = summary.get(id_field).and_then(Value::as_str).map(str::to_string);
                if id.is_none_or(|id| seen.insert(id)) {
                    summaries.push(summary);
                }
            }
        }

        Ok(summaries)
    }

    /// List one collection and project the requested properties
    async fn retrieve_kind(
        &self,
        kind: &str,
        properties: &[&str],
    ) -> Result<Vec<Value>, InventoryError> {
        let (collection, id_field) =
            collection_for(kind).ok_or_else(|| InventoryError::UnsupportedType(kind.to_string()))?;

        let summaries = self.list_summaries(kind, collection, id_field).await?;

        let mut refs = Vec::with_capacity(summaries.len());
        for summary in &summaries {
            let id = summary
                .get(id_field)
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    InventoryError::ParseError(format!("{kind} summary without '{id_field}'"))
                })?;
            refs.push(ObjectRef::new(kind, id));
        }

        let mut tags = if properties.contains(&"tag") && !refs.is_empty() {
            self.tags_for(&refs).await
        } else {
            HashMap::new()
        };

        let mut objects = Vec::with_capacity(summaries.len());
        for (summary, obj) in summaries.into_iter().zip(refs) {
            let mut record = Map::new();
            for property in properties {
                let value = match *property {
                    "name" => summary.get("name").cloned().unwrap_or(Value::Null),
                    "summary" => Value::Object(summary.clone()),
                    "tag" => tags.remove(&obj.value).unwrap_or(Value::Null),
                    other => {
                        return Err(InventoryError::UnknownProperty {
                            object_type: kind.to_string(),
                            property: other.to_string(),
                        });
                    }
                };
                record.insert((*property).to_string(), value);
            }
            record.insert("obj".to_string(), json!(obj));

            objects.push(Value::Object(record));
        }

        Ok(objects)
    }
}

#[async_trait]
impl InventoryClient for RestInventoryClient {
    fn root_folder(&self) -> ObjectRef {
        ObjectRef::new("Folder", ROOT_FOLDER)
    }

    #[instrument(skip(self))]
    async fn create_container_view(
        &self,
        container: &ObjectRef,
        kinds: &[String],
        recursive: bool,
    ) -> Result<ObjectRef, InventoryError> {
        if let Some(kind) = kinds.iter().find(|k| collection_for(k).is_none()) {
            return Err(InventoryError::UnsupportedType(kind.clone()));
        }

        let id = format!("session[{}]", self.next_view.fetch_add(1, Ordering::Relaxed));
        self.views.lock().await.insert(id.clone(), kinds.to_vec());

        debug!(view = %id, container = %container, recursive, "registered container view");

        Ok(ObjectRef::new(VIEW_KIND, id))
    }

    #[instrument(skip(self))]
    async fn retrieve(
        &self,
        view: &ObjectRef,
        kinds: &[String],
        properties: &[&str],
    ) -> Result<Vec<Value>, InventoryError> {
        let registered = self
            .views
            .lock()
            .await
            .get(&view.value)
            .cloned()
            .ok_or_else(|| InventoryError::UnknownView(view.value.clone()))?;

        for kind in kinds {
            if !registered.contains(kind) {
                return Err(InventoryError::UnsupportedType(kind.clone()));
            }
            if let Some(property) = properties
                .iter()
                .find(|p| !matches!(**p, "name" | "summary" | "tag"))
            {
                return Err(InventoryError::UnknownProperty {
                    object_type: kind.clone(),
                    property: (*property).to_string(),
                });
            }
        }

        let mut objects = Vec::new();
        for kind in kinds {
            objects.extend(self.retrieve_kind(kind, properties).await?);
        }

        Ok(objects)
    }

    #[instrument(skip(self))]
    async fn destroy_view(&self, view: &ObjectRef) -> Result<(), InventoryError> {
        self.views
            .lock()
            .await
            .remove(&view.value)
            .map(|_| ())
            .ok_or_else(|| InventoryError::UnknownView(view.value.clone()))
    }
}
