pub mod args;
pub mod cisco;
pub mod handlers;
pub mod state;

use axum::routing::{get, put};
use axum::{middleware, Router};

use productdb_common::auth;

use crate::handlers::{
    add_notification, change_settings, get_settings, healthz, list_notifications,
    notification_detail, remove_worker, status, whoami, worker_heartbeat,
};
use crate::state::AppState;

pub fn build_router(st: AppState) -> Router {
    let session_routes = Router::new()
        .route("/whoami", get(whoami))
        .route("/config/status", get(status))
        .route("/config/settings", get(get_settings).post(change_settings))
        .route("/notifications", get(list_notifications).post(add_notification))
        .route("/notifications/:id", get(notification_detail))
        .route("/workers/:hostname", put(worker_heartbeat).delete(remove_worker))
        .layer(middleware::from_fn_with_state(
            st.clone(),
            auth::auth_middleware::<AppState>,
        ))
        .with_state(st);

    let api_routes = Router::new()
        .route("/healthz", get(healthz))
        .merge(session_routes);

    Router::new().nest("/api", api_routes)
}
