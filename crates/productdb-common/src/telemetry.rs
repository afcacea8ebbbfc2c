use std::collections::HashMap;

use opentelemetry::trace::TracerProvider as TracerProviderTrait;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where and how a service reports its logs and traces.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    pub service_name: String,
    /// Base URL of an OTLP/HTTP collector; `/v1/traces` is appended by the exporter.
    pub otlp_endpoint: Option<String>,
    pub otlp_token: Option<String>,
}

fn otlp_headers(token: Option<&str>) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));
    }
    headers
}

/// Install the global subscriber: env filter (`RUST_LOG`, default `info`),
/// fmt output, and an OTLP layer when an endpoint is configured.
///
/// The returned provider must be kept alive and shut down before exit.
pub fn init_tracing(cfg: &TelemetryConfig) -> Option<TracerProvider> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer();

    let Some(endpoint) = cfg.otlp_endpoint.as_deref() else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
        return None;
    };

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .with_headers(otlp_headers(cfg.otlp_token.as_deref()))
        .build()
    {
        Ok(e) => e,
        Err(err) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .init();
            tracing::warn!(error=%err, "failed to create OTLP exporter, logging to stdout only");
            return None;
        }
    };

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(Resource::new([KeyValue::new(
            "service.name",
            cfg.service_name.clone(),
        )]))
        .build();

    let otel_layer =
        tracing_opentelemetry::layer().with_tracer(provider.tracer(cfg.service_name.clone()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    tracing::info!(endpoint, service_name=%cfg.service_name, "OTLP tracing enabled");
    Some(provider)
}
