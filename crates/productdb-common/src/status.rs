use serde::{Deserialize, Serialize};

pub const WORKERS_OFFLINE: &str =
    "All backend worker offline, asynchronous and scheduled tasks are not executed.";
pub const WORKERS_UNREGISTERED: &str =
    "Only unregistered backend worker found, asynchronous and scheduled tasks are not executed.";
pub const WORKERS_FOUND: &str = "Backend worker found.";

pub const API_NOT_ENABLED: &str = "Cisco EoX API integration not enabled";
pub const API_CONNECTED: &str = "successful connected to the Cisco EoX API";
pub const API_CONNECT_FAILED: &str =
    "failed to connect to the Cisco EoX API, please check the credentials";
pub const API_CHECK_UNAVAILABLE: &str = "unable to verify the access to the Cisco EoX API";

/// Backend health as seen by one status request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusReport {
    pub api_configured: bool,
    /// `None` when the API is not configured or the check failed.
    pub api_reachable: Option<bool>,
    pub worker_count: usize,
    pub any_worker_alive: bool,
}

impl StatusReport {
    pub fn worker_message(&self) -> &'static str {
        if self.worker_count == 0 {
            WORKERS_OFFLINE
        } else if self.any_worker_alive {
            WORKERS_FOUND
        } else {
            WORKERS_UNREGISTERED
        }
    }

    pub fn api_message(&self) -> &'static str {
        if !self.api_configured {
            return API_NOT_ENABLED;
        }
        match self.api_reachable {
            Some(true) => API_CONNECTED,
            Some(false) => API_CONNECT_FAILED,
            None => API_CHECK_UNAVAILABLE,
        }
    }
}
