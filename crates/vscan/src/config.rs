//! Configuration file discovery and command-line overrides

use std::path::{Path, PathBuf};

use vscan_core::{ConfigError, ScannerConfig};

/// Values given on the command line that take precedence over the file
#[derive(Debug, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub insecure: bool,
    pub log_level: Option<String>,
}

/// Load configuration from file
///
/// # Errors
/// Returns error if file cannot be read, parsed or validated
pub fn load(path: &Path) -> Result<ScannerConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    ScannerConfig::from_json(&content)
}

/// Candidate configuration paths, in lookup order
fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("config.json"),
        PathBuf::from("/etc/vscan/config.json"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("vscan/config.json"));
    }
    paths
}

/// The explicit path, or the first default path that exists
///
/// # Errors
/// Returns `NotFound` listing every path tried
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let paths = default_paths();
    if let Some(path) = paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let tried: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    Err(ConfigError::NotFound(tried.join(", ")))
}

/// Apply command-line overrides and re-validate
///
/// # Errors
/// Returns error if an override empties a required field
pub fn apply(mut config: ScannerConfig, overrides: Overrides) -> Result<ScannerConfig, ConfigError> {
    if let Some(url) = overrides.url {
        config.vmware_api_url = url;
    }
    if overrides.insecure {
        config.vmware_api_insecure = true;
    }
    if let Some(level) = overrides.log_level {
        config.log_level = level;
    }
    config.validate()?;
    Ok(config)
}
