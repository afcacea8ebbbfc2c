use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use productdb_status::{ApiAccessCheck, CheckError};

/// Checks Cisco API credentials by requesting a client-credentials token.
#[derive(Debug, Clone)]
pub struct OAuthTokenCheck {
    http: Client,
    token_url: String,
}

impl OAuthTokenCheck {
    pub fn new(token_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(3).min(timeout))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            token_url: token_url.into(),
        })
    }
}

#[async_trait]
impl ApiAccessCheck for OAuthTokenCheck {
    async fn check(&self, client_id: &str, client_secret: &str) -> Result<bool, CheckError> {
        let resp = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await
            .map_err(|e| CheckError::Transport(e.to_string()))?;

        let status = resp.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            tracing::info!(%status, "Cisco API rejected the client credentials");
            return Ok(false);
        }
        if !status.is_success() {
            return Err(CheckError::UnexpectedResponse(format!("token endpoint returned {status}")));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CheckError::UnexpectedResponse(e.to_string()))?;
        match body.get("access_token").and_then(|v| v.as_str()) {
            Some(token) if !token.is_empty() => Ok(true),
            _ => Err(CheckError::UnexpectedResponse(
                "token response without access_token".to_string(),
            )),
        }
    }
}
