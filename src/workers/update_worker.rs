// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{School, ScrapeResult};
use crate::domain::services::sensor_publisher::{SensorPublisher, SensorRecord};
use crate::infrastructure::observability::metrics;
use crate::utils::errors::WorkerError;
use crate::workers::orchestrator::SchoolOrchestrator;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 定时更新工作器
///
/// 启动时立即运行一次，之后每隔 `interval` 运行一次。每次运行结束后才等待
/// 下一个周期，运行期间错过的周期直接跳过，因此不会出现重叠的运行。
pub struct UpdateWorker {
    orchestrator: Arc<SchoolOrchestrator>,
    publisher: Option<Arc<dyn SensorPublisher>>,
    schools: Vec<School>,
    weeks: u32,
    interval: Duration,
}

impl UpdateWorker {
    pub fn new(
        orchestrator: Arc<SchoolOrchestrator>,
        publisher: Option<Arc<dyn SensorPublisher>>,
        schools: Vec<School>,
        weeks: u32,
        interval: Duration,
    ) -> Self {
        Self {
            orchestrator,
            publisher,
            schools,
            weeks,
            interval,
        }
    }

    /// 运行一个完整周期：抓取所有学校并发布传感器
    pub async fn run_once(&self) -> Result<Vec<ScrapeResult>, WorkerError> {
        if self.schools.is_empty() {
            warn!("No schools configured, nothing to scrape");
            return Ok(Vec::new());
        }

        let results = self.orchestrator.run(&self.schools, self.weeks).await?;
        for result in &results {
            info!(
                school = %result.school.slug,
                status = %result.status,
                weeks = result.calendar.week_count(),
                today = result.today.as_ref().map(|t| t.courses_count).unwrap_or(0),
                "Scrape result"
            );
        }

        if let Some(publisher) = &self.publisher {
            self.publish(publisher.as_ref(), &results).await;
        }
        Ok(results)
    }

    /// 发布失败只记录，不影响其他学校
    async fn publish(&self, publisher: &dyn SensorPublisher, results: &[ScrapeResult]) {
        let mut published = 0;
        for result in results {
            let record = SensorRecord::from_result(result);
            match publisher.publish(&record).await {
                Ok(()) => published += 1,
                Err(e) => {
                    metrics::record_publish_failure();
                    error!(
                        "Failed to publish {} via {}: {}",
                        record.entity_id,
                        publisher.name(),
                        e
                    );
                }
            }
        }
        info!("Published {}/{} sensor(s)", published, results.len());
    }
}

#[async_trait]
impl Worker for UpdateWorker {
    async fn run(&self, shutdown: CancellationToken) -> Result<(), WorkerError> {
        info!(
            "Update worker started, interval {:?}, {} school(s)",
            self.interval,
            self.schools.len()
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Update worker shutting down");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            let cycle = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Update worker shutting down during a run");
                    return Ok(());
                }
                cycle = self.run_once() => cycle,
            };

            // Configuration errors are fatal; later cycles would fail the same way.
            if let Err(e) = cycle {
                error!("Update cycle failed: {}", e);
                return Err(e);
            }
        }
    }

    fn name(&self) -> &str {
        "update_worker"
    }
}
