use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const SECRET_MASK: &str = "********";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only view of the settings the backend status reporter needs.
pub trait SettingsProvider: Send + Sync {
    fn is_cisco_api_enabled(&self) -> bool;
    fn cisco_api_client_id(&self) -> String;
    fn cisco_api_client_secret(&self) -> String;
}

/// Operator-editable application settings, persisted as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppSettings {
    pub login_only_mode: bool,
    pub cisco_api_enabled: bool,
    pub cisco_api_client_id: String,
    pub cisco_api_client_secret: String,
    pub cisco_eox_api_auto_sync_enabled: bool,
    pub auto_create_new_products: bool,
    pub cisco_eox_api_queries: String,
    pub product_blacklist_regex: String,
}

impl AppSettings {
    /// Load settings from `path`. A missing file yields the defaults.
    pub async fn read_file(path: &Path) -> Result<Self, SettingsError> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path=%path.display(), "settings file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_slice(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replace the file atomically: write a sibling temp file, then rename it
    /// over `path`, so readers never see a truncated document.
    pub async fn write_file(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        let bytes = serde_json::to_vec_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let tmp = temp_path(path);
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(e));
        }
        Ok(())
    }

    pub fn has_cisco_api_credentials(&self) -> bool {
        !self.cisco_api_client_id.trim().is_empty() && !self.cisco_api_client_secret.trim().is_empty()
    }

    /// Copy safe to return to clients.
    pub fn redacted(&self) -> Self {
        let mut out = self.clone();
        if !out.cisco_api_client_secret.is_empty() {
            out.cisco_api_client_secret = SECRET_MASK.to_string();
        }
        out
    }
}

impl SettingsProvider for AppSettings {
    fn is_cisco_api_enabled(&self) -> bool {
        self.cisco_api_enabled
    }

    fn cisco_api_client_id(&self) -> String {
        self.cisco_api_client_id.clone()
    }

    fn cisco_api_client_secret(&self) -> String {
        self.cisco_api_client_secret.clone()
    }
}

/// Partial update submitted by an operator. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub login_only_mode: Option<bool>,
    pub cisco_api_enabled: Option<bool>,
    pub cisco_api_client_id: Option<String>,
    pub cisco_api_client_secret: Option<String>,
    pub cisco_eox_api_auto_sync_enabled: Option<bool>,
    pub auto_create_new_products: Option<bool>,
    pub cisco_eox_api_queries: Option<String>,
    pub product_blacklist_regex: Option<String>,
}

impl SettingsUpdate {
    /// Apply onto `settings`. Returns true when the API enable flag or the
    /// credentials changed. A masked secret echoed back is ignored.
    pub fn apply(self, settings: &mut AppSettings) -> bool {
        let before = (
            settings.cisco_api_enabled,
            settings.cisco_api_client_id.clone(),
            settings.cisco_api_client_secret.clone(),
        );

        if let Some(v) = self.login_only_mode {
            settings.login_only_mode = v;
        }
        if let Some(v) = self.cisco_api_enabled {
            settings.cisco_api_enabled = v;
        }
        if let Some(v) = self.cisco_api_client_id {
            settings.cisco_api_client_id = v.trim().to_string();
        }
        if let Some(v) = self.cisco_api_client_secret {
            if v != SECRET_MASK {
                settings.cisco_api_client_secret = v.trim().to_string();
            }
        }
        if let Some(v) = self.cisco_eox_api_auto_sync_enabled {
            settings.cisco_eox_api_auto_sync_enabled = v;
        }
        if let Some(v) = self.auto_create_new_products {
            settings.auto_create_new_products = v;
        }
        if let Some(v) = self.cisco_eox_api_queries {
            settings.cisco_eox_api_queries = v;
        }
        if let Some(v) = self.product_blacklist_regex {
            settings.product_blacklist_regex = v;
        }

        before
            != (
                settings.cisco_api_enabled,
                settings.cisco_api_client_id.clone(),
                settings.cisco_api_client_secret.clone(),
            )
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
