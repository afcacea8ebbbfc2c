use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;

use crate::error::error_response;

// ── Role ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Superuser,
    /// Backend task worker; may only publish its own heartbeat.
    Worker,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Superuser => "superuser",
            Role::Worker => "worker",
        }
    }
}

// ── AuthContext ──────────────────────────────────────────────────────

/// Identity attached to every request. `role` is `None` for anonymous callers.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: String,
    pub role: Option<Role>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self {
            principal: "anonymous".into(),
            role: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.role.is_some()
    }

    pub fn is_superuser(&self) -> bool {
        self.role == Some(Role::Superuser)
    }
}

// ── AuthConfig ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub enabled: bool,
    pub tokens: Arc<HashMap<String, Role>>,
    pub rate_limits: Arc<Mutex<HashMap<String, RateWindow>>>,
    pub limit_per_minute: u64,
}

#[derive(Debug, Clone)]
pub struct RateWindow {
    pub window_start: Instant,
    pub count: u64,
}

impl AuthConfig {
    pub fn new(tokens: HashMap<String, Role>, limit_per_minute: u64) -> Self {
        Self {
            enabled: !tokens.is_empty(),
            tokens: Arc::new(tokens),
            rate_limits: Arc::new(Mutex::new(HashMap::new())),
            limit_per_minute,
        }
    }
}

// ── Environment parsing ─────────────────────────────────────────────

/// Parse `token:role` pairs separated by commas. Unknown roles and malformed
/// entries are skipped with a warning.
pub fn parse_tokens(raw: &str) -> HashMap<String, Role> {
    let mut tokens = HashMap::new();
    for entry in raw.split(',') {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((token, role_raw)) = trimmed.split_once(':') else {
            tracing::warn!("invalid PRODUCTDB_AUTH_TOKENS entry, expected token:role");
            continue;
        };
        let role = match role_raw.trim().to_ascii_lowercase().as_str() {
            "superuser" | "admin" => Role::Superuser,
            "user" => Role::User,
            "worker" => Role::Worker,
            other => {
                tracing::warn!(role=%other, "unknown role in PRODUCTDB_AUTH_TOKENS, skipping");
                continue;
            }
        };
        tokens.insert(token.trim().to_string(), role);
    }
    tokens
}

pub fn parse_auth_from_env() -> AuthConfig {
    let tokens = std::env::var("PRODUCTDB_AUTH_TOKENS")
        .map(|raw| parse_tokens(&raw))
        .unwrap_or_default();

    let limit_per_minute = std::env::var("PRODUCTDB_AUTH_RATE_LIMIT_PER_MINUTE")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(120);

    let auth = AuthConfig::new(tokens, limit_per_minute);
    if !auth.enabled {
        tracing::warn!("auth disabled: PRODUCTDB_AUTH_TOKENS not set, every caller is a superuser");
    }
    auth
}

// ── Middleware ───────────────────────────────────────────────────────
// Generic over any state type S that implements AsRef<AuthConfig>.
// Requests without a token pass through as anonymous; handlers decide.

pub async fn auth_middleware<S>(
    State(state): State<S>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, std::convert::Infallible>
where
    S: AsRef<AuthConfig> + Clone + Send + Sync + 'static,
{
    let auth = state.as_ref();

    if !auth.enabled {
        req.extensions_mut().insert(AuthContext {
            principal: "guest".into(),
            role: Some(Role::Superuser),
        });
        return Ok(next.run(req).await);
    }

    let Some(token) = extract_token(&req) else {
        req.extensions_mut().insert(AuthContext::anonymous());
        return Ok(next.run(req).await);
    };

    let Some(role) = auth.tokens.get(&token).copied() else {
        return Ok(unauthorized("invalid token"));
    };

    if auth.limit_per_minute > 0 {
        let mut guard = auth.rate_limits.lock().await;
        let now = Instant::now();
        let entry = guard.entry(token.clone()).or_insert(RateWindow {
            window_start: now,
            count: 0,
        });
        if now.duration_since(entry.window_start) >= Duration::from_secs(60) {
            entry.window_start = now;
            entry.count = 0;
        }
        if entry.count >= auth.limit_per_minute {
            return Ok(error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "rate limited",
            ));
        }
        entry.count += 1;
    }

    req.extensions_mut().insert(AuthContext {
        principal: token,
        role: Some(role),
    });

    Ok(next.run(req).await)
}

fn extract_token(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            req.headers()
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}

// ── Permission checks ───────────────────────────────────────────────
// Return None when the caller may proceed, or Some(response) to send back.

pub fn require_superuser(ctx: &AuthContext) -> Option<Response> {
    match ctx.role {
        Some(Role::Superuser) => None,
        Some(Role::User | Role::Worker) => Some(forbidden("superuser permissions required")),
        None => Some(login_required()),
    }
}

/// Heartbeat ingress: worker tokens, or a superuser acting for a worker.
pub fn require_worker(ctx: &AuthContext) -> Option<Response> {
    match ctx.role {
        Some(Role::Worker | Role::Superuser) => None,
        Some(Role::User) => Some(forbidden("worker permissions required")),
        None => Some(login_required()),
    }
}

pub fn require_login(ctx: &AuthContext) -> Option<Response> {
    if ctx.is_authenticated() {
        None
    } else {
        Some(login_required())
    }
}

// ── Error helpers ───────────────────────────────────────────────────

pub fn unauthorized(msg: &str) -> Response {
    error_response(StatusCode::UNAUTHORIZED, "unauthorized", msg)
}

pub fn login_required() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "login_required", "login required")
}

pub fn forbidden(msg: &str) -> Response {
    error_response(StatusCode::FORBIDDEN, "forbidden", msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        let tokens =
            parse_tokens("root-token:superuser, view:user,broken,x:wizard,,a:ADMIN,celery:worker");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens.get("celery"), Some(&Role::Worker));
        assert_eq!(tokens.get("root-token"), Some(&Role::Superuser));
        assert_eq!(tokens.get("view"), Some(&Role::User));
        assert_eq!(tokens.get("a"), Some(&Role::Superuser));
        assert!(!tokens.contains_key("x"));
    }

    #[test]
    fn test_empty_tokens_disable_auth() {
        assert!(!AuthConfig::new(HashMap::new(), 0).enabled);
        assert!(AuthConfig::new(parse_tokens("t:user"), 0).enabled);
    }

    #[test]
    fn test_require_superuser() {
        let anon = AuthContext::anonymous();
        let resp = require_superuser(&anon).unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let user = AuthContext {
            principal: "u".into(),
            role: Some(Role::User),
        };
        assert_eq!(require_superuser(&user).unwrap().status(), StatusCode::FORBIDDEN);
        assert!(require_login(&user).is_none());

        let root = AuthContext {
            principal: "r".into(),
            role: Some(Role::Superuser),
        };
        assert!(require_superuser(&root).is_none());
        assert!(root.is_superuser());
    }

    #[test]
    fn test_require_worker() {
        let worker = AuthContext {
            principal: "celery".into(),
            role: Some(Role::Worker),
        };
        assert!(require_worker(&worker).is_none());
        assert_eq!(require_superuser(&worker).unwrap().status(), StatusCode::FORBIDDEN);

        let user = AuthContext {
            principal: "u".into(),
            role: Some(Role::User),
        };
        assert_eq!(require_worker(&user).unwrap().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            require_worker(&AuthContext::anonymous()).unwrap().status(),
            StatusCode::UNAUTHORIZED
        );

        let root = AuthContext {
            principal: "r".into(),
            role: Some(Role::Superuser),
        };
        assert!(require_worker(&root).is_none());
    }
}
