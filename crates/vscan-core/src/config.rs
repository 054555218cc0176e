//! Scanner configuration

use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;
use vscan_inventory::Credentials;

use crate::error::ConfigError;

/// Default blob service host suffix
pub const DEFAULT_BLOB_HOST: &str = "blob.core.windows.net";

/// Configuration for a single scan run
#[derive(Clone, Deserialize)]
pub struct ScannerConfig {
    /// Inventory service URL
    #[serde(default)]
    pub vmware_api_url: String,
    /// Inventory username
    #[serde(default)]
    pub vmware_api_username: String,
    /// Inventory password
    #[serde(default)]
    pub vmware_api_password: String,
    /// Skip TLS certificate verification
    #[serde(default, alias = "wmvare_api_insecure")]
    pub vmware_api_insecure: bool,
    /// Storage account receiving the report
    #[serde(default)]
    pub klarity_storage_name: String,
    /// Customer container
    #[serde(default)]
    pub klarity_customer_id: String,
    /// Installation directory inside the customer container
    #[serde(default)]
    pub klarity_installation_id: String,
    /// Pre-issued SAS token
    #[serde(default)]
    pub klarity_sas_token: String,
    /// Object types to scan, in order
    #[serde(default)]
    pub scanned_objects: Vec<String>,
    /// Blob service host suffix
    #[serde(default = "default_blob_host")]
    pub blob_host: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_blob_host() -> String {
    DEFAULT_BLOB_HOST.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl ScannerConfig {
    /// Parse and validate a JSON configuration document
    ///
    /// # Errors
    /// Returns an error if the document is malformed or fails validation.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: ScannerConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every required field is present
    ///
    /// # Errors
    /// Returns the first missing field, or a duplicated object type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("vmware_api_url", &self.vmware_api_url),
            ("vmware_api_username", &self.vmware_api_username),
            ("vmware_api_password", &self.vmware_api_password),
            ("klarity_storage_name", &self.klarity_storage_name),
            ("klarity_customer_id", &self.klarity_customer_id),
            ("klarity_installation_id", &self.klarity_installation_id),
            ("klarity_sas_token", &self.klarity_sas_token),
            ("blob_host", &self.blob_host),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(name));
            }
        }

        if self.scanned_objects.is_empty() {
            return Err(ConfigError::MissingField("scanned_objects"));
        }

        let mut seen = HashSet::new();
        for object_type in &self.scanned_objects {
            if object_type.trim().is_empty() {
                return Err(ConfigError::MissingField("scanned_objects[]"));
            }
            if !seen.insert(object_type.as_str()) {
                return Err(ConfigError::DuplicateObjectType(object_type.clone()));
            }
        }

        Ok(())
    }

    /// Credentials for the inventory and tagging sessions
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.vmware_api_username, &self.vmware_api_password)
    }
}

impl fmt::Debug for ScannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScannerConfig")
            .field("vmware_api_url", &self.vmware_api_url)
            .field("vmware_api_username", &self.vmware_api_username)
            .field("vmware_api_insecure", &self.vmware_api_insecure)
            .field("klarity_storage_name", &self.klarity_storage_name)
            .field("klarity_customer_id", &self.klarity_customer_id)
            .field("klarity_installation_id", &self.klarity_installation_id)
            .field("scanned_objects", &self.scanned_objects)
            .field("blob_host", &self.blob_host)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}
