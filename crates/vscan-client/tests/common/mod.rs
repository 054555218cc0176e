#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};

pub const USERNAME: &str = "scanner";
pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "session-token-1";

/// Basic auth header for `scanner:secret`
const BASIC_AUTH: &str = "Basic c2Nhbm5lcjpzZWNyZXQ=";

/// Bind `app` to an ephemeral local port and return its base URL
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// ============================================================================
// Fake vCenter
// ============================================================================

#[derive(Default)]
pub struct VcenterState {
    pub logins: AtomicUsize,
    pub logouts: AtomicUsize,
    pub batch_tag_lookups: AtomicUsize,
    pub fail_folders: bool,
    /// Refuse unfiltered `vm` listings as too large
    pub vm_result_cap: bool,
    /// Object whose tag lookups fail with 503
    pub fail_tags_for: Option<String>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("vmware-api-session-id")
        .is_some_and(|v| v == TOKEN)
}

async fn login(State(state): State<Arc<VcenterState>>, headers: HeaderMap) -> Response {
    if headers.get("authorization").is_none_or(|v| v != BASIC_AUTH) {
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }
    state.logins.fetch_add(1, Ordering::SeqCst);
    Json(TOKEN).into_response()
}

async fn logout(State(state): State<Arc<VcenterState>>, headers: HeaderMap) -> StatusCode {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    state.logouts.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

async fn list_collection(
    State(state): State<Arc<VcenterState>>,
    Path(collection): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let datacenter = query.get("datacenters").map(String::as_str);
    let body = match (collection.as_str(), datacenter) {
        ("vm", None) if state.vm_result_cap => {
            let error = json!({
                "error_type": "UNABLE_TO_ALLOCATE_RESOURCE",
                "messages": [{"default_message": "Too many virtual machines. Add more filter criteria to reduce the number."}]
            });
            return (StatusCode::BAD_REQUEST, Json(error)).into_response();
        }
        ("vm", Some("datacenter-1")) => json!([
            {"vm": "vm-101", "name": "web-1", "power_state": "POWERED_ON", "cpu_count": 2, "memory_size_MiB": 4096}
        ]),
        ("vm", Some("datacenter-2")) => json!([
            {"vm": "vm-102", "name": "web-2", "power_state": "POWERED_OFF", "cpu_count": 1, "memory_size_MiB": 2048}
        ]),
        ("vm", Some(_)) => json!([]),
        ("vm", None) => json!([
            {"vm": "vm-101", "name": "web-1", "power_state": "POWERED_ON", "cpu_count": 2, "memory_size_MiB": 4096},
            {"vm": "vm-102", "name": "web-2", "power_state": "POWERED_OFF", "cpu_count": 1, "memory_size_MiB": 2048}
        ]),
        ("datacenter", _) => json!([
            {"datacenter": "datacenter-1", "name": "dc-east"},
            {"datacenter": "datacenter-2", "name": "dc-west"}
        ]),
        ("folder", _) if state.fail_folders => {
            return (StatusCode::SERVICE_UNAVAILABLE, "view retrieve timeout").into_response();
        }
        ("folder", _) => json!([
            {"folder": "group-v3", "name": "vm", "type": "VIRTUAL_MACHINE"}
        ]),
        ("network", _) => json!([
            {"network": "network-12", "name": "VM Network", "type": "STANDARD_PORTGROUP"}
        ]),
        _ => json!([]),
    };
    Json(body).into_response()
}

fn tags_of(id: &str) -> Value {
    if id == "vm-101" {
        json!(["tag-prod"])
    } else {
        json!([])
    }
}

async fn list_attached_tags(
    State(state): State<Arc<VcenterState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let failing = |id: &Value| state.fail_tags_for.as_deref().is_some_and(|f| id == f);

    match query.get("action").map(String::as_str) {
        Some("list-attached-tags") => {
            let id = &body["object_id"]["id"];
            if failing(id) {
                return (StatusCode::SERVICE_UNAVAILABLE, "transient").into_response();
            }
            Json(tags_of(id.as_str().unwrap_or_default())).into_response()
        }
        Some("list-attached-tags-on-objects") => {
            state.batch_tag_lookups.fetch_add(1, Ordering::SeqCst);
            let ids = body["object_ids"].as_array().cloned().unwrap_or_default();
            if ids.iter().any(|o| failing(&o["id"])) {
                return (StatusCode::SERVICE_UNAVAILABLE, "transient").into_response();
            }
            let entries: Vec<Value> = ids
                .iter()
                .map(|o| {
                    json!({
                        "object_id": o,
                        "tag_ids": tags_of(o["id"].as_str().unwrap_or_default())
                    })
                })
                .collect();
            Json(entries).into_response()
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn list_tags(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!(["tag-prod", "tag-orphan", "tag-broken"])).into_response()
}

async fn get_tag(Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let name = id.trim_start_matches("tag-");
    Json(json!({
        "id": id,
        "name": name,
        "category_id": "cat-env",
        "description": "",
        "used_by": []
    }))
    .into_response()
}

async fn get_category(Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "id": id,
        "name": "env",
        "description": "Environment",
        "cardinality": "SINGLE",
        "associable_types": [],
        "used_by": []
    }))
    .into_response()
}

async fn list_attached_objects(
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if query.get("action").map(String::as_str) != Some("list-attached-objects") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    match id.as_str() {
        "tag-prod" => Json(json!([{"type": "VirtualMachine", "id": "vm-101"}])).into_response(),
        "tag-broken" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => Json(json!([])).into_response(),
    }
}

pub fn vcenter(state: Arc<VcenterState>) -> Router {
    Router::new()
        .route("/api/session", post(login).delete(logout))
        .route("/api/vcenter/{collection}", get(list_collection))
        .route("/api/cis/tagging/tag", get(list_tags))
        .route("/api/cis/tagging/tag/{id}", get(get_tag))
        .route("/api/cis/tagging/category/{id}", get(get_category))
        .route("/api/cis/tagging/tag-association", post(list_attached_tags))
        .route(
            "/api/cis/tagging/tag-association/{id}",
            post(list_attached_objects),
        )
        .with_state(state)
}

// ============================================================================
// Fake blob store
// ============================================================================

#[derive(Debug, Clone)]
pub struct Upload {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct BlobState {
    pub status: AtomicU16,
    pub uploads: Mutex<Vec<Upload>>,
}

impl BlobState {
    pub fn new(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status: AtomicU16::new(status),
            uploads: Mutex::new(Vec::new()),
        })
    }
}

async fn upload(
    State(state): State<Arc<BlobState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.uploads.lock().unwrap().push(Upload {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });
    let status = StatusCode::from_u16(state.status.load(Ordering::SeqCst)).unwrap();
    (status, "").into_response()
}

pub fn blob_store(state: Arc<BlobState>) -> Router {
    Router::new()
        .route("/{*path}", put(upload))
        .with_state(state)
}
