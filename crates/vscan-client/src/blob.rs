//! Blob store publisher

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use tracing::{info, instrument};
use url::Url;
use vscan_api::Report;
use vscan_core::{PublishError, ReportPublisher};

/// Blob type header
pub const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";

/// Request date header
pub const DATE_HEADER: &str = "x-ms-date";

/// Where reports are uploaded
///
/// Each report lands at `{endpoint}/{path...}/{timestamp}.json?{sas_token}`.
#[derive(Debug, Clone)]
pub struct BlobTarget {
    endpoint: Url,
    path: Vec<String>,
    sas_token: String,
}

impl BlobTarget {
    /// Target inside an Azure-style storage account
    ///
    /// # Errors
    /// Returns an error if the account and host do not form a valid URL.
    pub fn azure(
        storage_account: &str,
        blob_host: &str,
        path: Vec<String>,
        sas_token: impl Into<String>,
    ) -> Result<Self, PublishError> {
        let endpoint = Url::parse(&format!("https://{storage_account}.{blob_host}/"))
            .map_err(|e| PublishError::Request(format!("invalid storage endpoint: {e}")))?;
        Ok(Self::with_endpoint(endpoint, path, sas_token))
    }

    /// Target at an explicit endpoint
    pub fn with_endpoint(endpoint: Url, path: Vec<String>, sas_token: impl Into<String>) -> Self {
        Self {
            endpoint,
            path,
            sas_token: sas_token.into(),
        }
    }

    /// Blob URL for a report uploaded at `timestamp`
    ///
    /// # Errors
    /// Returns an error if the endpoint cannot carry a path.
    pub fn blob_url(&self, timestamp: DateTime<Utc>) -> Result<Url, PublishError> {
        let name = format!(
            "{}.json",
            timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        );

        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| PublishError::Request(format!("invalid storage endpoint: {}", self.endpoint)))?
            .pop_if_empty()
            .extend(&self.path)
            .push(&name);

        let token = self.sas_token.trim_start_matches('?');
        url.set_query((!token.is_empty()).then_some(token));

        Ok(url)
    }
}

/// Format a timestamp as an HTTP date
fn http_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Publishes reports with a single blob PUT
pub struct BlobPublisher {
    client: Client,
    target: BlobTarget,
}

impl BlobPublisher {
    /// Create a new publisher
    pub fn new(target: BlobTarget) -> Self {
        Self::with_client(target, Client::new())
    }

    /// Create a new publisher with custom `reqwest::Client`
    pub fn with_client(target: BlobTarget, client: Client) -> Self {
        Self { client, target }
    }
}

#[async_trait]
impl ReportPublisher for BlobPublisher {
    #[instrument(skip(self, report))]
    async fn publish(&self, report: &Report) -> Result<(), PublishError> {
        let payload = report.to_json_vec()?;
        let now = Utc::now();
        let url = self.target.blob_url(now)?;

        info!(path = %url.path(), bytes = payload.len(), "uploading report");

        let response = self
            .client
            .put(url)
            .header(BLOB_TYPE_HEADER, "BlockBlob")
            .header(DATE_HEADER, http_date(now))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Status { status, body });
        }

        Ok(())
    }
}
