use async_trait::async_trait;
use thiserror::Error;

/// Why a reachability check could not produce a yes/no answer.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Verifies that the external lifecycle API accepts a set of credentials.
///
/// `Ok(false)` means the API answered and rejected the credentials.
#[async_trait]
pub trait ApiAccessCheck: Send + Sync {
    async fn check(&self, client_id: &str, client_secret: &str) -> Result<bool, CheckError>;
}
