use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use productdb_common::auth::AuthConfig;
use productdb_common::AppSettings;
use productdb_meta::SharedMetaStore;
use productdb_status::{MetaWorkerRegistry, StatusReporter};

#[derive(Clone)]
pub struct AppState {
    pub store: SharedMetaStore,
    pub reporter: Arc<StatusReporter>,
    pub workers: MetaWorkerRegistry,
    pub settings: Arc<RwLock<AppSettings>>,
    pub settings_path: PathBuf,
    pub auth: AuthConfig,
}

impl AppState {
    pub async fn settings_snapshot(&self) -> AppSettings {
        self.settings.read().await.clone()
    }
}

impl AsRef<AuthConfig> for AppState {
    fn as_ref(&self) -> &AuthConfig {
        &self.auth
    }
}
