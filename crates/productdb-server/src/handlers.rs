use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::json;

use productdb_common::auth::{require_login, require_superuser, require_worker, AuthContext};
use productdb_common::notification::notification_key;
use productdb_common::util::now_ms;
use productdb_common::{
    error_response, AppSettings, ErrorResponse, NewNotification, NotificationMessage,
    SettingsUpdate, StatusReport, WorkerState,
};
use productdb_meta::{get_json, list_json, put_json};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub report: StatusReport,
    pub worker_message: &'static str,
    pub api_message: &'static str,
}

impl From<StatusReport> for StatusResponse {
    fn from(report: StatusReport) -> Self {
        Self {
            worker_message: report.worker_message(),
            api_message: report.api_message(),
            report,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Serialize)]
pub struct UserMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl UserMessage {
    fn new(level: MessageLevel, text: &str) -> Self {
        Self {
            level,
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: AppSettings,
    pub messages: Vec<UserMessage>,
}

// Body extractors run as the last argument so the role gate answers first.
fn invalid_body(rejection: JsonRejection) -> Response {
    error_response(StatusCode::BAD_REQUEST, "invalid_request", &rejection.body_text())
}

pub async fn healthz() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

pub async fn whoami(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    Json(json!({
        "principal": ctx.principal,
        "role": ctx.role.map(|r| r.as_str()).unwrap_or("anonymous"),
    }))
}

pub async fn status(
    State(st): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Response {
    if let Some(resp) = require_superuser(&ctx) {
        return resp;
    }

    let settings = st.settings_snapshot().await;
    let report = st.reporter.compute_status(&settings).await;
    tracing::debug!(?report, "backend status computed");

    (StatusCode::OK, Json(StatusResponse::from(report))).into_response()
}

pub async fn get_settings(
    State(st): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Response {
    if let Some(resp) = require_superuser(&ctx) {
        return resp;
    }
    let settings = st.settings_snapshot().await;
    (StatusCode::OK, Json(settings.redacted())).into_response()
}

pub async fn change_settings(
    State(st): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<SettingsUpdate>, JsonRejection>,
) -> Response {
    if let Some(resp) = require_superuser(&ctx) {
        return resp;
    }
    let Json(update) = match payload {
        Ok(body) => body,
        Err(e) => return invalid_body(e),
    };

    let (settings, api_changed) = {
        let mut guard = st.settings.write().await;
        let mut next = guard.clone();
        let api_changed = update.apply(&mut next);
        if let Err(e) = next.write_file(&st.settings_path).await {
            tracing::error!(error=%e, "failed to persist settings");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "settings_error",
                &format!("failed to save settings: {}", e),
            );
        }
        *guard = next.clone();
        (next, api_changed)
    };
    tracing::info!(principal=%ctx.principal, api_changed, "settings updated");

    let mut messages = vec![UserMessage::new(
        MessageLevel::Success,
        "Settings saved successfully",
    )];

    if api_changed {
        if let Err(e) = st.reporter.clear_api_cache().await {
            tracing::warn!(error=%e, "failed to clear API reachability cache");
        }
    }

    if settings.cisco_api_enabled {
        if !settings.has_cisco_api_credentials() {
            messages.push(UserMessage::new(
                MessageLevel::Warning,
                "Please configure the Cisco API client ID and client secret",
            ));
        } else if api_changed {
            let (level, text) = match st.reporter.check_api_access(&settings).await {
                Some(true) => (
                    MessageLevel::Success,
                    "Successfully connected to the Cisco EoX API",
                ),
                Some(false) => (
                    MessageLevel::Error,
                    "Cannot access the Cisco EoX API with the given credentials",
                ),
                None => (
                    MessageLevel::Warning,
                    "Unable to verify the access to the Cisco EoX API",
                ),
            };
            messages.push(UserMessage::new(level, text));
        }
    }

    let body = SettingsResponse {
        settings: settings.redacted(),
        messages,
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Notification routes are public unless login-only mode is on.
async fn check_notification_access(st: &AppState, ctx: &AuthContext) -> Option<Response> {
    if st.settings.read().await.login_only_mode {
        require_login(ctx)
    } else {
        None
    }
}

pub async fn list_notifications(
    State(st): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Response {
    if let Some(resp) = check_notification_access(&st, &ctx).await {
        return resp;
    }

    let mut messages: Vec<NotificationMessage> =
        match list_json(st.store.as_ref(), "/notifications/").await {
            Ok(m) => m,
            Err(e) => {
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_error",
                    &format!("store error: {}", e),
                )
            }
        };
    messages.sort_by(|a, b| b.created.cmp(&a.created));

    (StatusCode::OK, Json(messages)).into_response()
}

pub async fn notification_detail(
    State(st): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Response {
    if let Some(resp) = check_notification_access(&st, &ctx).await {
        return resp;
    }

    match get_json::<NotificationMessage>(st.store.as_ref(), &notification_key(&id)).await {
        Ok(Some(msg)) => (StatusCode::OK, Json(msg)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "not_found", "notification not found"),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            &format!("store error: {}", e),
        ),
    }
}

pub async fn add_notification(
    State(st): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<NewNotification>, JsonRejection>,
) -> Response {
    if let Some(resp) = require_superuser(&ctx) {
        return resp;
    }
    let Json(form) = match payload {
        Ok(body) => body,
        Err(e) => return invalid_body(e),
    };

    let msg = match form.validate() {
        Ok(msg) => msg,
        Err(errors) => {
            return ErrorResponse::new("invalid_request", "invalid notification")
                .with_details(json!(errors))
                .into_response_with(StatusCode::BAD_REQUEST);
        }
    };

    if let Err(e) = put_json(st.store.as_ref(), &msg.key(), &msg, None).await {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            &format!("store error: {}", e),
        );
    }
    tracing::info!(id=%msg.id, title=%msg.title, "notification added");

    (StatusCode::CREATED, Json(msg)).into_response()
}

pub async fn worker_heartbeat(
    State(st): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(hostname): Path<String>,
) -> Response {
    if let Some(resp) = require_worker(&ctx) {
        return resp;
    }
    let hostname = hostname.trim();
    if hostname.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "invalid_request", "hostname is empty");
    }

    let state = WorkerState {
        hostname: hostname.to_string(),
        last_heartbeat_ms: now_ms(),
    };
    if let Err(e) = st.workers.publish(&state).await {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            &format!("store error: {}", e),
        );
    }
    tracing::debug!(hostname=%state.hostname, principal=%ctx.principal, "worker heartbeat");

    (StatusCode::OK, Json(state)).into_response()
}

pub async fn remove_worker(
    State(st): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(hostname): Path<String>,
) -> Response {
    if let Some(resp) = require_worker(&ctx) {
        return resp;
    }

    if let Err(e) = st.workers.remove(&hostname).await {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            &format!("store error: {}", e),
        );
    }
    tracing::info!(hostname=%hostname, principal=%ctx.principal, "worker removed");

    StatusCode::NO_CONTENT.into_response()
}
