//! Optional TOML configuration for the scheduling policies.

use std::path::{Path, PathBuf};

use services::ServicePolicies;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Load policies from `path`, or the defaults when no file is given.
///
/// Values are only parsed here; range checks happen when the services are built.
pub fn load(path: Option<&Path>) -> Result<ServicePolicies, ConfigError> {
    let Some(path) = path else {
        return Ok(ServicePolicies::default());
    };
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let policies = parse(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("loaded policies from {}", path.display());
    Ok(policies)
}

fn parse(raw: &str) -> Result<ServicePolicies, toml::de::Error> {
    toml::from_str(raw)
}
