//! 仓储读取监控

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// 仓储监控工具
pub struct RepositoryMetrics;

impl RepositoryMetrics {
    /// 记录查询（计时）
    pub fn record_query(elapsed: Duration, table: &str, operation: &str) {
        histogram!(
            "repository_query_duration_ms",
            "table" => table.to_string(),
            "operation" => operation.to_string()
        )
        .record(elapsed.as_secs_f64() * 1000.0);

        counter!(
            "repository_queries_total",
            "table" => table.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    /// 记录查询错误
    pub fn record_error(table: &str, operation: &str) {
        counter!(
            "repository_query_errors_total",
            "table" => table.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }
}

/// 用于计时的守卫结构
pub struct QueryTimer {
    start: Instant,
    table: &'static str,
    operation: &'static str,
    slow_threshold: Duration,
}

impl QueryTimer {
    pub fn new(table: &'static str, operation: &'static str, slow_threshold: Duration) -> Self {
        Self {
            start: Instant::now(),
            table,
            operation,
            slow_threshold,
        }
    }

    pub fn finish(self) {
        let elapsed = self.start.elapsed();
        RepositoryMetrics::record_query(elapsed, self.table, self.operation);

        if elapsed > self.slow_threshold {
            tracing::warn!(
                table = self.table,
                operation = self.operation,
                duration_ms = elapsed.as_millis() as u64,
                "Slow query detected"
            );
            counter!(
                "repository_slow_queries_total",
                "table" => self.table,
                "operation" => self.operation
            )
            .increment(1);
        }
    }

    pub fn finish_with_error(self) {
        let elapsed = self.start.elapsed();
        RepositoryMetrics::record_query(elapsed, self.table, self.operation);
        RepositoryMetrics::record_error(self.table, self.operation);

        if elapsed > self.slow_threshold {
            tracing::warn!(
                table = self.table,
                operation = self.operation,
                duration_ms = elapsed.as_millis() as u64,
                "Slow query detected (with error)"
            );
        }
    }

    /// 按结果结束计时
    pub fn observe<T, E>(self, result: &Result<T, E>) {
        match result {
            Ok(_) => self.finish(),
            Err(_) => self.finish_with_error(),
        }
    }
}
