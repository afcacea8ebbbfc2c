use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    #[arg(long, env = "PRODUCTDB_SERVER_ADDR", default_value = "0.0.0.0:18090")]
    pub listen_addr: String,

    /// etcd endpoint for the shared cache and worker registry. Without it an
    /// in-process store is used.
    #[arg(long, env = "ETCD_ENDPOINT")]
    pub etcd_endpoint: Option<String>,

    #[arg(long, env = "PRODUCTDB_SETTINGS_PATH", default_value = "conf/productdb.json")]
    pub settings_path: PathBuf,

    #[arg(
        long,
        env = "CISCO_API_TOKEN_URL",
        default_value = "https://cloudsso.cisco.com/as/token.oauth2"
    )]
    pub cisco_token_url: String,

    #[arg(long, env = "CISCO_API_CHECK_TIMEOUT_SECS", default_value_t = 10)]
    pub api_check_timeout_secs: u64,

    /// Lifetime of a cached reachability result. Unset keeps it until cleared.
    #[arg(long, env = "CISCO_API_CACHE_TTL_SECS")]
    pub api_cache_ttl_secs: Option<u64>,

    /// Heartbeat age after which a worker no longer counts as alive.
    #[arg(long, env = "PRODUCTDB_WORKER_TIMEOUT_SECS", default_value_t = 60)]
    pub worker_heartbeat_timeout_secs: u64,

    /// OTLP endpoint for exporting traces.
    #[arg(long, env = "OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Bearer token for the OTLP collector.
    #[arg(long, env = "OTLP_TOKEN")]
    pub otlp_token: Option<String>,
}
