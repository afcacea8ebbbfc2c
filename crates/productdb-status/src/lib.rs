//! Backend status reporting: external API reachability plus worker liveness.

use std::sync::Arc;

use tracing::{debug, warn};

use productdb_common::{SettingsProvider, StatusReport};

pub mod cache;
pub mod check;
pub mod workers;

pub use cache::{ApiReachabilityCache, CISCO_EOX_API_TEST};
pub use check::{ApiAccessCheck, CheckError};
pub use workers::{MetaWorkerRegistry, WorkerDescriptor, WorkerRegistry};

pub struct StatusReporter {
    cache: ApiReachabilityCache,
    checker: Arc<dyn ApiAccessCheck>,
    workers: Arc<dyn WorkerRegistry>,
}

impl std::fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusReporter")
            .field("cache", &self.cache)
            .finish()
    }
}

impl StatusReporter {
    pub fn new(
        cache: ApiReachabilityCache,
        checker: Arc<dyn ApiAccessCheck>,
        workers: Arc<dyn WorkerRegistry>,
    ) -> Self {
        Self {
            cache,
            checker,
            workers,
        }
    }

    /// Build the status report for the current settings. Never fails:
    /// collaborator errors are logged and folded into the report.
    pub async fn compute_status(&self, settings: &dyn SettingsProvider) -> StatusReport {
        let api_configured = settings.is_cisco_api_enabled();
        let api_reachable = if api_configured {
            self.check_api_access(settings).await
        } else {
            None
        };

        let workers = match self.workers.workers().await {
            Ok(w) => w,
            Err(e) => {
                warn!(error=%e, "failed to read worker registry");
                Vec::new()
            }
        };

        StatusReport {
            api_configured,
            api_reachable,
            worker_count: workers.len(),
            any_worker_alive: workers.iter().any(|w| w.alive),
        }
    }

    /// Run a check now. The cache holds the last completed result and is
    /// written only when the check completes; an error leaves it unchanged.
    pub async fn check_api_access(&self, settings: &dyn SettingsProvider) -> Option<bool> {
        let client_id = settings.cisco_api_client_id();
        let client_secret = settings.cisco_api_client_secret();

        match self.checker.check(&client_id, &client_secret).await {
            Ok(reachable) => {
                if let Err(e) = self.cache.set(reachable).await {
                    warn!(error=%e, "failed to store API reachability result");
                }
                debug!(reachable, "Cisco EoX API reachability checked");
                Some(reachable)
            }
            Err(e) => {
                warn!(error=%e, "Cisco EoX API reachability check failed");
                None
            }
        }
    }

    /// Forget the cached reachability result.
    pub async fn clear_api_cache(&self) -> anyhow::Result<()> {
        self.cache.delete().await
    }
}
