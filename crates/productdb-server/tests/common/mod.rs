use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use productdb_common::auth::{parse_tokens, AuthConfig};
use productdb_common::util::now_ms;
use productdb_common::{AppSettings, WorkerState};
use productdb_meta::{MemoryMetaStore, SharedMetaStore};
use productdb_server::build_router;
use productdb_server::state::AppState;
use productdb_status::{
    ApiAccessCheck, ApiReachabilityCache, CheckError, MetaWorkerRegistry, StatusReporter,
};

pub const SUPERUSER_TOKEN: &str = "root-token";
pub const USER_TOKEN: &str = "user-token";
pub const WORKER_TOKEN: &str = "worker-token";

/// Reachability check whose outcome the test can change; `None` errors.
pub struct ScriptedCheck {
    outcome: Mutex<Option<bool>>,
    calls: AtomicUsize,
}

impl ScriptedCheck {
    pub fn set(&self, outcome: Option<bool>) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApiAccessCheck for ScriptedCheck {
    async fn check(&self, _client_id: &str, _client_secret: &str) -> Result<bool, CheckError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = *self.outcome.lock().unwrap();
        outcome.ok_or_else(|| CheckError::Transport("connection refused".into()))
    }
}

pub struct TestServer {
    pub addr: std::net::SocketAddr,
    pub store: SharedMetaStore,
    pub cache: ApiReachabilityCache,
    pub workers: MetaWorkerRegistry,
    pub check: Arc<ScriptedCheck>,
    pub settings_path: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

impl TestServer {
    pub async fn new(settings: AppSettings) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings_path = dir.path().join("productdb.json");

        let store: SharedMetaStore = Arc::new(MemoryMetaStore::new());
        let cache = ApiReachabilityCache::new(store.clone(), None);
        let workers = MetaWorkerRegistry::new(store.clone(), Duration::from_secs(60));
        let check = Arc::new(ScriptedCheck {
            outcome: Mutex::new(Some(true)),
            calls: AtomicUsize::new(0),
        });
        let reporter = StatusReporter::new(cache.clone(), check.clone(), Arc::new(workers.clone()));

        let st = AppState {
            store: store.clone(),
            reporter: Arc::new(reporter),
            workers: workers.clone(),
            settings: Arc::new(RwLock::new(settings)),
            settings_path: settings_path.clone(),
            auth: AuthConfig::new(
                parse_tokens(&format!(
                    "{SUPERUSER_TOKEN}:superuser,{USER_TOKEN}:user,{WORKER_TOKEN}:worker"
                )),
                0,
            ),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(st);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            store,
            cache,
            workers,
            check,
            settings_path,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}/api{}", self.addr, path)
    }

    pub async fn add_worker(&self, hostname: &str, alive: bool) {
        let last_heartbeat_ms = if alive {
            now_ms()
        } else {
            now_ms().saturating_sub(3_600_000)
        };
        self.workers
            .publish(&WorkerState {
                hostname: hostname.to_string(),
                last_heartbeat_ms,
            })
            .await
            .unwrap();
    }
}

pub fn api_enabled_settings() -> AppSettings {
    AppSettings {
        cisco_api_enabled: true,
        cisco_api_client_id: "client_id".into(),
        cisco_api_client_secret: "client_secret".into(),
        ..Default::default()
    }
}
