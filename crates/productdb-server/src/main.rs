use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::RwLock;

use productdb_common::auth::parse_auth_from_env;
use productdb_common::telemetry::{init_tracing, TelemetryConfig};
use productdb_common::AppSettings;
use productdb_meta::{EtcdMetaStore, MemoryMetaStore, SharedMetaStore};
use productdb_server::args::Args;
use productdb_server::cisco::OAuthTokenCheck;
use productdb_server::state::AppState;
use productdb_server::build_router;
use productdb_status::{ApiReachabilityCache, MetaWorkerRegistry, StatusReporter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let tracer = init_tracing(&TelemetryConfig {
        service_name: "productdb-server".to_string(),
        otlp_endpoint: args.otlp_endpoint.clone(),
        otlp_token: args.otlp_token.clone(),
    });

    let store: SharedMetaStore = match &args.etcd_endpoint {
        Some(endpoint) => {
            let store = EtcdMetaStore::connect(std::slice::from_ref(endpoint)).await?;
            tracing::info!(endpoint=%endpoint, "connected to etcd");
            Arc::new(store)
        }
        None => {
            tracing::warn!("no etcd endpoint configured, using in-process store");
            Arc::new(MemoryMetaStore::new())
        }
    };

    let settings = AppSettings::read_file(&args.settings_path).await?;

    let checker = OAuthTokenCheck::new(
        args.cisco_token_url.clone(),
        Duration::from_secs(args.api_check_timeout_secs),
    )?;
    let cache = ApiReachabilityCache::new(
        store.clone(),
        args.api_cache_ttl_secs.map(Duration::from_secs),
    );
    let workers = MetaWorkerRegistry::new(
        store.clone(),
        Duration::from_secs(args.worker_heartbeat_timeout_secs),
    );
    let reporter = StatusReporter::new(cache, Arc::new(checker), Arc::new(workers.clone()));

    let st = AppState {
        store,
        reporter: Arc::new(reporter),
        workers,
        settings: Arc::new(RwLock::new(settings)),
        settings_path: args.settings_path.clone(),
        auth: parse_auth_from_env(),
    };

    let app = build_router(st);

    let listener = tokio::net::TcpListener::bind(&args.listen_addr).await?;
    tracing::info!(addr=%args.listen_addr, "productdb-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    if let Some(provider) = tracer {
        if let Err(e) = provider.shutdown() {
            eprintln!("failed to shut down tracer provider: {e}");
        }
    }
    Ok(())
}
