//! Saved parameters file handling
//!
//! Lets an operator capture the non-secret inputs of a run as JSON and
//! replay or validate them later. Credentials are never part of this file;
//! they are regenerated on every run unless preservation is requested.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::params::{self, RawParameters};
use crate::types::DEFAULT_INSTALL_DIR;

/// Saved (non-secret) provisioning parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    pub install_dir: PathBuf,
    /// None means auto-detect at run time
    pub host_address: Option<String>,
    /// Raw entries, validated on load and again at resolution time
    pub permitted_addresses: Vec<String>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            host_address: None,
            permitted_addresses: Vec::new(),
        }
    }
}

impl ProvisionConfig {
    /// Capture resolved inputs for saving.
    pub fn from_raw(raw: &RawParameters) -> Self {
        Self {
            install_dir: raw
                .install_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INSTALL_DIR)),
            host_address: raw.host_address.clone(),
            permitted_addresses: raw.permitted.clone(),
        }
    }

    /// Turn a saved file back into raw inputs, with CLI values taking
    /// precedence over saved ones.
    pub fn into_raw(self, overrides: RawParameters) -> RawParameters {
        RawParameters {
            install_dir: overrides.install_dir.or(Some(self.install_dir)),
            host_address: overrides.host_address.or(self.host_address),
            permitted: if overrides.permitted.is_empty() {
                self.permitted_addresses
            } else {
                overrides.permitted
            },
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize parameters to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write parameters to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read parameters from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse parameters JSON")?;

        Ok(config)
    }

    /// Validate the saved values without running the pipeline.
    pub fn validate(&self) -> Result<()> {
        params::validate_install_dir(&self.install_dir)?;

        if let Some(host) = &self.host_address {
            host.trim()
                .parse::<std::net::IpAddr>()
                .map_err(|_| anyhow::anyhow!("host address '{}' is not an IP address", host))?;
        }

        params::parse_permitted_list(&self.permitted_addresses)?;
        Ok(())
    }
}
