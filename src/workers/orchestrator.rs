// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{validate_school, validate_weeks};
use crate::domain::models::{School, ScrapeResult};
use crate::domain::services::calendar_service::CalendarAggregator;
use crate::utils::clock::Clock;
use crate::utils::errors::ConfigError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub const DEADLINE_EXCEEDED: &str = "run deadline exceeded";

/// 学校编排器
///
/// 依次为每个学校运行日历聚合，同一时间只有一个浏览器会话。
/// 单个学校的失败（包括任务 panic）只影响该学校的结果。
pub struct SchoolOrchestrator {
    aggregator: Arc<CalendarAggregator>,
    clock: Arc<dyn Clock>,
    /// 学校之间的间隔
    school_delay: Duration,
    /// 单次运行的总时限
    run_deadline: Option<Duration>,
}

impl SchoolOrchestrator {
    pub fn new(aggregator: Arc<CalendarAggregator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            aggregator,
            clock,
            school_delay: Duration::ZERO,
            run_deadline: None,
        }
    }

    pub fn with_school_delay(mut self, delay: Duration) -> Self {
        self.school_delay = delay;
        self
    }

    pub fn with_run_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.run_deadline = deadline;
        self
    }

    /// 抓取所有学校
    ///
    /// 配置在任何浏览器工作之前校验。返回的结果与输入一一对应且顺序一致。
    pub async fn run(
        &self,
        schools: &[School],
        weeks: u32,
    ) -> Result<Vec<ScrapeResult>, ConfigError> {
        validate_weeks(weeks)?;
        for school in schools {
            validate_school(school)?;
        }

        info!("Scraping {} school(s), {} week(s) each", schools.len(), weeks);

        let cancel = CancellationToken::new();
        let deadline_task = self.run_deadline.map(|deadline| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                sleep(deadline).await;
                warn!("Run deadline of {:?} reached", deadline);
                cancel.cancel();
            })
        });

        let mut results = Vec::with_capacity(schools.len());
        for (index, school) in schools.iter().enumerate() {
            if index > 0 && !self.school_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = sleep(self.school_delay) => {}
                }
            }

            if cancel.is_cancelled() {
                warn!("Skipping {}: {}", school.name, DEADLINE_EXCEEDED);
                results.push(ScrapeResult::failure(
                    school.clone(),
                    weeks,
                    DEADLINE_EXCEEDED,
                    self.clock.now(),
                ));
                continue;
            }

            results.push(self.scrape_isolated(school, weeks, &cancel).await);
        }

        if let Some(task) = deadline_task {
            task.abort();
        }

        Ok(results)
    }

    /// 在独立任务中抓取一个学校，任务 panic 时转换为失败结果
    async fn scrape_isolated(
        &self,
        school: &School,
        weeks: u32,
        cancel: &CancellationToken,
    ) -> ScrapeResult {
        let aggregator = self.aggregator.clone();
        let task_school = school.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            aggregator.build_calendar(&task_school, weeks, &token).await
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                error!("Scrape task for {} failed: {}", school.name, e);
                ScrapeResult::failure(
                    school.clone(),
                    weeks,
                    format!("scrape task failed: {}", e),
                    self.clock.now(),
                )
            }
        }
    }
}
