use crate::cli::ProviderArgs;
use anyhow::{Context, Result, anyhow};
use factory::{ClientConfig, ConfigError, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("deploymeta"))
}

/// Default location of the provider config file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

// ============================================================================
// Provider Config
// ============================================================================

/// Connection settings for the configuration service.
///
/// Every field is optional in the file; flags and environment variables
/// fill in or override what the file leaves out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub base_url: Option<String>,
    pub licence_key: Option<String>,
    pub deployment_name: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    /// Load the config file.
    ///
    /// An explicitly requested file must exist; the default one may be
    /// missing.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = default_config_path()?;
                if !path.exists() {
                    log::debug!("No provider config at {}", path.display());
                    return Ok(Self::default());
                }
                path
            }
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid provider config: {}", path.display()))?;
        log::debug!("Loaded provider config from {}", path.display());
        Ok(config)
    }

    /// Overlay flags and environment on top of the file
    pub fn with_overrides(mut self, args: &ProviderArgs) -> Self {
        if let Some(base_url) = &args.base_url {
            self.base_url = Some(base_url.clone());
        }
        if let Some(key) = &args.licence_key {
            self.licence_key = Some(key.clone());
        }
        if let Some(name) = &args.deployment_name {
            self.deployment_name = Some(name.clone());
        }
        if let Some(timeout) = args.timeout {
            self.timeout_secs = Some(timeout);
        }
        self
    }

    pub fn into_client_config(self) -> Result<ClientConfig> {
        let timeout = self
            .timeout_secs
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        let config = ClientConfig::new(
            self.licence_key.unwrap_or_default(),
            self.deployment_name.unwrap_or_default(),
        )
        .with_base_url(self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()))
        .with_timeout(timeout);

        config
            .validate()
            .map_err(|e| anyhow!("{e}\n  hint: {}", hint(&e)))?;
        Ok(config)
    }
}

fn hint(err: &ConfigError) -> &'static str {
    match err {
        ConfigError::MissingLicenceKey => {
            "pass --licence-key or set DEPLOYMETA_LICENCE_KEY (or licence_key in the config file)"
        }
        ConfigError::MissingDeploymentName => {
            "pass --deployment-name or set DEPLOYMETA_DEPLOYMENT_NAME (or deployment_name in the config file)"
        }
        ConfigError::InvalidBaseUrl(_) => "check --base-url, DEPLOYMETA_BASE_URL or base_url",
    }
}
