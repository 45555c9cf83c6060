//! telemetry - 可观测性库

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    Tracing(String),

    #[error("Failed to install Prometheus recorder: {0}")]
    Metrics(String),
}

/// 初始化 tracing
pub fn init_tracing(log_level: &str) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| TelemetryError::Tracing(e.to_string()))
}

/// 初始化 JSON 格式的 tracing（生产环境）
pub fn init_tracing_json(log_level: &str) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .map_err(|e| TelemetryError::Tracing(e.to_string()))
}

/// 初始化 Prometheus metrics
///
/// 全局 recorder 只能安装一次，重复安装返回错误。
pub fn init_metrics() -> Result<PrometheusHandle, TelemetryError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::Metrics(e.to_string()))
}

/// 预先注册指标描述，便于导出端显示单位与说明
pub fn describe_metrics() {
    metrics::describe_histogram!(
        "repository_query_duration_ms",
        metrics::Unit::Milliseconds,
        "Repository read duration"
    );
    metrics::describe_counter!("repository_queries_total", "Repository reads executed");
    metrics::describe_counter!("uow_commits_total", "Unit of work commits");
    metrics::describe_counter!("uow_rollbacks_total", "Unit of work rollbacks");
    metrics::describe_counter!(
        "uow_flushed_changes_total",
        "Row changes flushed to the store"
    );
}
