//! Authenticated REST session against the vCenter Automation API

use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use url::Url;
use vscan_inventory::{Credentials, InventoryError};

/// Header carrying the session token
pub const SESSION_HEADER: &str = "vmware-api-session-id";

/// REST session
///
/// Holds the HTTP client, the service origin and the session token once
/// [`RestSession::login`] succeeded.
pub struct RestSession {
    client: Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl RestSession {
    /// Create a new, unauthenticated session
    ///
    /// Only the scheme, host and port of `url` are kept, so the SOAP SDK
    /// URL (`https://vcenter/sdk`) can be passed unchanged.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(url: impl AsRef<str>, insecure: bool) -> Result<Self, InventoryError> {
        let mut base_url = Url::parse(url.as_ref())
            .map_err(|e| InventoryError::ConnectionFailed(format!("invalid URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(InventoryError::ConnectionFailed(format!(
                "invalid URL: {base_url}"
            )));
        }
        base_url.set_path("/");
        base_url.set_query(None);
        base_url.set_fragment(None);

        let client = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| InventoryError::ConnectionFailed(e.to_string()))?;

        Ok(Self::with_client(base_url, client))
    }

    /// Create a session with a custom `reqwest::Client`
    pub fn with_client(base_url: Url, client: Client) -> Self {
        Self {
            client,
            base_url,
            token: RwLock::new(None),
        }
    }

    /// Build a URL from path segments and optional `action` parameter
    ///
    /// # Errors
    /// Returns an error if the base URL cannot carry a path.
    pub fn url(&self, segments: &[&str], action: Option<&str>) -> Result<Url, InventoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| InventoryError::ConnectionFailed(format!("invalid URL: {}", self.base_url)))?
            .clear()
            .extend(segments);
        if let Some(action) = action {
            url.query_pairs_mut().append_pair("action", action);
        }
        Ok(url)
    }

    /// Whether a token is held
    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Create a session token with basic authentication
    ///
    /// # Errors
    /// Returns `ConnectionFailed` if the service is unreachable or rejects
    /// the credentials.
    #[instrument(skip(self, credentials), fields(user = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<(), InventoryError> {
        let url = self.url(&["api", "session"], None)?;
        let response = self
            .client
            .post(url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await
            .map_err(|e| InventoryError::ConnectionFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(InventoryError::ConnectionFailed(format!(
                "login rejected ({status}): {message}"
            )));
        }

        let token: String = response
            .json()
            .await
            .map_err(|e| InventoryError::ParseError(e.to_string()))?;

        *self.token.write().await = Some(token);
        debug!("session created");

        Ok(())
    }

    /// Delete the session token
    ///
    /// Failures are logged; the local token is dropped either way.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let Some(token) = self.token.write().await.take() else {
            return;
        };

        let result = match self.url(&["api", "session"], None) {
            Ok(url) => self
                .client
                .delete(url)
                .header(SESSION_HEADER, token)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(()) => debug!("session deleted"),
            Err(e) => warn!(error = %e, "failed to delete session"),
        }
    }

    /// Attach the session token to a request
    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, InventoryError> {
        let token = self.token.read().await;
        let token = token.as_ref().ok_or(InventoryError::NotLoggedIn)?;
        Ok(request.header(SESSION_HEADER, token.as_str()))
    }

    /// Perform a GET request and deserialize the response
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status, or a
    /// body that does not decode as `T`.
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, InventoryError> {
        let request = self.authorize(self.client.get(url)).await?;
        let response = request
            .send()
            .await
            .map_err(|e| InventoryError::Transport(e.to_string()))?;
        decode(response).await
    }

    /// Perform a POST request with JSON body and deserialize the response
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status, or a
    /// body that does not decode as `T`.
    pub async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<T, InventoryError> {
        let request = self.authorize(self.client.post(url).json(body)).await?;
        let response = request
            .send()
            .await
            .map_err(|e| InventoryError::Transport(e.to_string()))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, InventoryError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        return Err(InventoryError::Api { status, message });
    }

    response
        .json()
        .await
        .map_err(|e| InventoryError::ParseError(e.to_string()))
}
