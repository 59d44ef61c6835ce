//! Deploy settings.
//!
//! Stored as camelCase JSON. Every field has a default, so a partial or
//! empty object is a valid settings file.

use std::path::Path;
use std::time::Duration;

use ovfdeploy_lease::PollConfig;
use ovfdeploy_transfer::{DEFAULT_CHUNK_SIZE, UploadMethod};
use serde::{Deserialize, Serialize};

/// Errors from loading or validating settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Tunables for the deploy flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploySettings {
    /// Upload chunk size in bytes.
    pub chunk_size: usize,
    /// HTTP method used to push disk files to their device URLs.
    pub upload_method: UploadMethod,
    /// First delay between lease state polls.
    pub lease_poll_initial_ms: u64,
    /// Cap on the delay between lease state polls.
    pub lease_poll_max_ms: u64,
    /// Maximum wait for the lease to become ready; `null` waits forever.
    pub lease_ready_timeout_secs: Option<u64>,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            upload_method: UploadMethod::Post,
            lease_poll_initial_ms: 250,
            lease_poll_max_ms: 5_000,
            lease_ready_timeout_secs: Some(30 * 60),
        }
    }
}

impl DeploySettings {
    /// Reads and validates settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: DeploySettings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Like [`DeploySettings::load`], falling back to defaults when the file
    /// is missing or unusable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to load deploy settings, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Writes the settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!(path = %path.display(), "deploy settings saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.chunk_size == 0 {
            return Err(SettingsError::Invalid("chunkSize must be positive".into()));
        }
        if self.lease_poll_initial_ms == 0 {
            return Err(SettingsError::Invalid(
                "leasePollInitialMs must be positive".into(),
            ));
        }
        if self.lease_poll_max_ms < self.lease_poll_initial_ms {
            return Err(SettingsError::Invalid(
                "leasePollMaxMs must not be below leasePollInitialMs".into(),
            ));
        }
        if self.lease_ready_timeout_secs == Some(0) {
            return Err(SettingsError::Invalid(
                "leaseReadyTimeoutSecs must be positive or null".into(),
            ));
        }
        Ok(())
    }

    /// Lease readiness polling derived from these settings.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            initial_interval: Duration::from_millis(self.lease_poll_initial_ms),
            max_interval: Duration::from_millis(self.lease_poll_max_ms),
            timeout: self.lease_ready_timeout_secs.map(Duration::from_secs),
            ..PollConfig::default()
        }
    }
}
