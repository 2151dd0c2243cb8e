// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::validate_weeks;
use crate::domain::models::{Calendar, School, ScrapeResult, ScrapeStatus, TodayView};
use crate::engines::day_extractor::DayExtractor;
use crate::engines::navigator::{NavigatorSettings, PageNavigator};
use crate::engines::traits::BrowserLauncher;
use crate::infrastructure::observability::metrics;
use crate::utils::clock::Clock;
use crate::utils::errors::{ExtractionError, ScrapeError};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// 逐周抓取停止的原因
#[derive(Debug)]
enum StopReason {
    /// 获取了全部请求的周
    Completed,
    /// 页面上没有更多的周
    EndOfData,
    /// 运行时限已到
    Cancelled,
    /// 某一周出错
    Failed(ScrapeError),
}

/// 日历聚合服务
///
/// 为一个学校驱动导航器和日期提取器，把多周的单日菜单合并成一个日历
pub struct CalendarAggregator {
    launcher: Arc<dyn BrowserLauncher>,
    navigator_settings: NavigatorSettings,
    extractor: DayExtractor,
    clock: Arc<dyn Clock>,
}

impl CalendarAggregator {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        navigator_settings: NavigatorSettings,
        extractor: DayExtractor,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            launcher,
            navigator_settings,
            extractor,
            clock,
        }
    }

    /// 构建一个学校的菜单日历
    ///
    /// 永远返回一个结果：第一周就失败时为 `Failure`，之后的失败、
    /// 数据提前结束或被取消时为 `PartialFailure` 并保留已获取的周。
    /// 浏览器会话在所有退出路径上都会被释放。
    ///
    /// # Arguments
    ///
    /// * `school` - 抓取目标
    /// * `weeks` - 请求的周数（1..=10）
    /// * `cancel` - 在翻页边界检查的取消令牌
    #[instrument(skip(self, school, cancel), fields(school = %school.slug))]
    pub async fn build_calendar(
        &self,
        school: &School,
        weeks: u32,
        cancel: &CancellationToken,
    ) -> ScrapeResult {
        let started = Instant::now();
        let result = self.scrape(school, weeks, cancel).await;

        metrics::record_scrape(result.status, result.weeks_collected, started.elapsed());
        info!(
            status = %result.status,
            weeks_collected = result.weeks_collected,
            weeks_requested = result.weeks_requested,
            days = result.calendar.day_count(),
            "Finished scraping {}",
            school.name
        );
        result
    }

    async fn scrape(&self, school: &School, weeks: u32, cancel: &CancellationToken) -> ScrapeResult {
        if let Err(e) = validate_weeks(weeks) {
            return ScrapeResult::failure(school.clone(), weeks, e.to_string(), self.clock.now());
        }

        let mut navigator = match PageNavigator::open(
            self.launcher.as_ref(),
            school,
            self.navigator_settings.clone(),
        )
        .await
        {
            Ok(navigator) => navigator,
            Err(e) => {
                error!("Failed to open menu page for {}: {}", school.name, e);
                return ScrapeResult::failure(school.clone(), weeks, e.to_string(), self.clock.now());
            }
        };

        let mut calendar = Calendar::new();
        let (weeks_collected, stop) = self
            .collect_weeks(&mut navigator, &mut calendar, weeks, cancel)
            .await;
        navigator.close().await;

        let (status, error) = match stop {
            StopReason::Completed => (ScrapeStatus::Ok, None),
            StopReason::Failed(e) if weeks_collected == 0 => {
                error!("First week of {} could not be read: {}", school.name, e);
                return ScrapeResult::failure(school.clone(), weeks, e.to_string(), self.clock.now());
            }
            StopReason::Failed(e) => {
                warn!(
                    "Stopped after {} week(s) for {}: {}",
                    weeks_collected, school.name, e
                );
                (ScrapeStatus::PartialFailure, Some(e.to_string()))
            }
            StopReason::EndOfData => (
                ScrapeStatus::PartialFailure,
                Some(format!(
                    "only {} of {} weeks published",
                    weeks_collected, weeks
                )),
            ),
            StopReason::Cancelled => (
                ScrapeStatus::PartialFailure,
                Some("run deadline exceeded".to_string()),
            ),
        };

        let today = TodayView::for_date(&calendar, self.clock.today());
        ScrapeResult {
            school: school.clone(),
            calendar,
            today,
            last_updated: self.clock.now(),
            status,
            weeks_requested: weeks,
            weeks_collected,
            error,
        }
    }

    /// 逐周提取并合并，返回成功读取的周数和停止原因
    async fn collect_weeks(
        &self,
        navigator: &mut PageNavigator,
        calendar: &mut Calendar,
        weeks: u32,
        cancel: &CancellationToken,
    ) -> (u32, StopReason) {
        // Latest date read so far; a new week must reach past it.
        let mut latest: Option<NaiveDate> = None;
        for week_index in 0..weeks {
            let days = match self.extractor.extract_days(navigator.session()).await {
                Ok(days) => days,
                Err(e) => return (week_index, StopReason::Failed(e.into())),
            };
            info!(week_index, days = days.len(), "Extracted week");

            if let Some(newest) = days.iter().map(|d| d.date).max() {
                if let Some(previous) = latest.filter(|previous| newest <= *previous) {
                    warn!("Week {} repeats dates up to {}", week_index, previous);
                    return (
                        week_index,
                        StopReason::Failed(ExtractionError::StaleWeek(previous).into()),
                    );
                }
                latest = Some(newest);
            }

            for day in days {
                if let Some(previous) = calendar.insert(day) {
                    info!("Date {} read twice, keeping the later read", previous.date);
                }
            }

            let collected = week_index + 1;
            if collected == weeks {
                break;
            }

            if cancel.is_cancelled() {
                warn!("Run deadline reached after {} week(s)", collected);
                return (collected, StopReason::Cancelled);
            }

            let advanced = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Run deadline reached while advancing from week {}", week_index);
                    return (collected, StopReason::Cancelled);
                }
                advanced = navigator.advance() => advanced,
            };

            match advanced {
                Ok(true) => {}
                Ok(false) => {
                    info!("No further weeks after week {}", week_index);
                    return (collected, StopReason::EndOfData);
                }
                Err(e) => return (collected, StopReason::Failed(e.into())),
            }
        }

        (weeks, StopReason::Completed)
    }
}
