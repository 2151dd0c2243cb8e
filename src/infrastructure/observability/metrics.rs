// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use crate::domain::models::ScrapeStatus;
use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

pub const SCRAPES_TOTAL: &str = "skolmaten_scrapes_total";
pub const WEEKS_COLLECTED: &str = "skolmaten_weeks_collected";
pub const SCRAPE_DURATION: &str = "skolmaten_scrape_duration_seconds";
pub const PUBLISH_FAILURES_TOTAL: &str = "skolmaten_publish_failures_total";

/// 初始化指标系统
///
/// 未启用时只注册指标描述，记录操作在没有 recorder 的情况下为空操作
pub fn init_metrics(settings: &MetricsSettings) -> Result<()> {
    if settings.enabled {
        let addr: SocketAddr = settings
            .listen
            .parse()
            .with_context(|| format!("invalid metrics listen address `{}`", settings.listen))?;
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus recorder")?;
        info!("Prometheus exporter listening on {}", addr);
    }

    describe_counter!(SCRAPES_TOTAL, "Total number of school scrapes by status");
    describe_histogram!(
        WEEKS_COLLECTED,
        "Number of weeks collected per school scrape"
    );
    describe_histogram!(
        SCRAPE_DURATION,
        "Duration of a single school scrape in seconds"
    );
    describe_counter!(
        PUBLISH_FAILURES_TOTAL,
        "Total number of sensor publications rejected or failed"
    );
    Ok(())
}

/// 记录一次学校抓取的结果
pub fn record_scrape(status: ScrapeStatus, weeks_collected: u32, elapsed: Duration) {
    counter!(SCRAPES_TOTAL, "status" => status.to_string()).increment(1);
    histogram!(WEEKS_COLLECTED).record(weeks_collected as f64);
    histogram!(SCRAPE_DURATION).record(elapsed.as_secs_f64());
}

/// 记录一次发布失败
pub fn record_publish_failure() {
    counter!(PUBLISH_FAILURES_TOTAL).increment(1);
}
