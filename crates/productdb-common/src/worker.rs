use serde::{Deserialize, Serialize};

/// Heartbeat record published by a backend task worker.
///
/// Stored under `/workers/{hostname}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerState {
    pub hostname: String,
    pub last_heartbeat_ms: u64,
}

impl WorkerState {
    pub fn key(&self) -> String {
        format!("/workers/{}", self.hostname)
    }

    /// A worker counts as alive while its last heartbeat is at most
    /// `timeout_ms` old. Heartbeats from the future are treated as fresh.
    pub fn is_alive(&self, now_ms: u64, timeout_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_heartbeat_ms) <= timeout_ms
    }
}
