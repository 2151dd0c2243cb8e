// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 测试辅助工具
//!
//! 提供一个按脚本运行的浏览器驱动，模拟 skolmaten.se 的逐周菜单页面

use async_trait::async_trait;
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use skolmaten::domain::models::School;
use skolmaten::domain::services::calendar_service::CalendarAggregator;
use skolmaten::engines::day_extractor::DayExtractor;
use skolmaten::engines::navigator::NavigatorSettings;
use skolmaten::engines::traits::{BrowserDriver, BrowserLauncher, ControlOutcome};
use skolmaten::utils::clock::{Clock, FixedClock};
use skolmaten::utils::errors::DriverError;
use skolmaten::utils::retry_policy::RetryPolicy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const CONTAINER: &str = "#menu-container";
pub const TITLE: &str = ".text-2xl.font-semibold";

const SV_DAYS: [&str; 7] = [
    "Måndag", "Tisdag", "Onsdag", "Torsdag", "Fredag", "Lördag", "Söndag",
];

/// 一个周页面
#[derive(Debug, Clone)]
pub struct FakePage {
    pub title: String,
    /// 菜单容器文本，`None` 表示容器不存在
    pub content: Option<String>,
}

impl FakePage {
    /// 从周一开始生成一周的页面，`days` 为 (相对周一的偏移, 菜品行)
    pub fn week(monday: NaiveDate, days: Vec<(i64, Vec<&str>)>) -> Self {
        let week = monday.iso_week().week();
        let mut content = format!("Vecka {}\n", week);
        for (offset, lines) in days {
            let date = monday + ChronoDuration::days(offset);
            content.push_str(SV_DAYS[date.weekday().num_days_from_monday() as usize]);
            content.push('\n');
            content.push_str(&date.format("%Y-%m-%d").to_string());
            content.push('\n');
            for line in lines {
                content.push_str(line);
                content.push('\n');
            }
        }
        Self {
            title: format!("Vecka {}", week),
            content: Some(content),
        }
    }

    /// 周一到周五，每天一道菜
    pub fn workweek(monday: NaiveDate) -> Self {
        Self::week(
            monday,
            vec![
                (0, vec!["Fiskgratäng med dillsås"]),
                (1, vec!["Köttbullar med potatismos"]),
                (2, vec!["Ärtsoppa och pannkakor"]),
                (3, vec!["Kycklinggryta med ris"]),
                (4, vec!["Tacos"]),
            ],
        )
    }

    pub fn raw(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            content: Some(content.to_string()),
        }
    }
}

/// 一个学校页面的脚本
#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pub pages: Vec<FakePage>,
    /// 加载页面超时
    pub load_fails: bool,
    /// 加载页面时 panic
    pub panic_on_load: bool,
    /// 前 N 次点击不生效
    pub inert_clicks: usize,
    /// 最后一页的 "下一周" 按钮是禁用状态而不是不存在
    pub disabled_at_end: bool,
    /// 点击生效后的前 N 次读取仍显示上一周的菜单且没有周标题
    pub title_gap_reads: usize,
}

impl FakeSite {
    pub fn with_pages(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    /// 从 `monday` 开始连续 `count` 周的工作日菜单
    pub fn consecutive(monday: NaiveDate, count: usize) -> Self {
        let pages = (0..count)
            .map(|i| FakePage::workweek(monday + ChronoDuration::weeks(i as i64)))
            .collect();
        Self::with_pages(pages)
    }

    pub fn failing() -> Self {
        Self {
            load_fails: true,
            ..Default::default()
        }
    }
}

/// 驱动调用计数
#[derive(Debug, Default)]
pub struct FakeStats {
    pub launches: AtomicUsize,
    pub loads: AtomicUsize,
    pub clicks: AtomicUsize,
    pub closes: AtomicUsize,
}

impl FakeStats {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn clicks(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct FakeDriver {
    sites: Arc<HashMap<String, FakeSite>>,
    stats: Arc<FakeStats>,
    site: Option<FakeSite>,
    current: usize,
    inert_remaining: usize,
    gap_remaining: usize,
    closed: bool,
}

impl FakeDriver {
    fn page(&self) -> Option<&FakePage> {
        self.site.as_ref().and_then(|s| s.pages.get(self.current))
    }

    fn previous_page(&self) -> Option<&FakePage> {
        let index = self.current.checked_sub(1)?;
        self.site.as_ref().and_then(|s| s.pages.get(index))
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn load(
        &mut self,
        url: &str,
        _ready_selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        self.stats.loads.fetch_add(1, Ordering::SeqCst);
        let slug = url.rsplit('/').next().unwrap_or_default();
        let site = self
            .sites
            .get(slug)
            .cloned()
            .ok_or(DriverError::Timeout(timeout))?;

        if site.panic_on_load {
            panic!("renderer crashed while loading {}", url);
        }
        if site.load_fails {
            return Err(DriverError::Timeout(timeout));
        }

        self.inert_remaining = site.inert_clicks;
        self.gap_remaining = 0;
        self.current = 0;
        let ready = site.pages.first().and_then(|p| p.content.as_ref()).is_some();
        self.site = Some(site);
        if ready {
            Ok(())
        } else {
            Err(DriverError::Timeout(timeout))
        }
    }

    async fn click_control(
        &mut self,
        _labels: &[String],
        _timeout: Duration,
    ) -> Result<ControlOutcome, DriverError> {
        if self.closed {
            return Err(DriverError::Closed);
        }
        let Some(site) = &self.site else {
            return Ok(ControlOutcome::Missing);
        };
        if self.current + 1 >= site.pages.len() {
            return Ok(if site.disabled_at_end {
                ControlOutcome::Disabled
            } else {
                ControlOutcome::Missing
            });
        }

        self.stats.clicks.fetch_add(1, Ordering::SeqCst);
        if self.inert_remaining > 0 {
            self.inert_remaining -= 1;
        } else {
            self.current += 1;
            self.gap_remaining = site.title_gap_reads;
        }
        Ok(ControlOutcome::Clicked)
    }

    async fn read_text(&mut self, selector: &str) -> Result<Option<String>, DriverError> {
        if self.closed {
            return Err(DriverError::Closed);
        }
        if self.gap_remaining > 0 {
            self.gap_remaining -= 1;
            // Half re-rendered: old menu still shown, title not yet there.
            return Ok(match selector {
                CONTAINER => self.previous_page().and_then(|p| p.content.clone()),
                _ => None,
            });
        }
        let Some(page) = self.page() else {
            return Ok(None);
        };
        Ok(match selector {
            CONTAINER => page.content.clone(),
            TITLE if !page.title.is_empty() => Some(page.title.clone()),
            _ => None,
        })
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if !self.closed {
            self.closed = true;
            self.stats.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// 按学校 slug 分发页面脚本的启动器
pub struct FakeLauncher {
    sites: Arc<HashMap<String, FakeSite>>,
    pub stats: Arc<FakeStats>,
}

impl FakeLauncher {
    pub fn new(sites: Vec<(&str, FakeSite)>) -> Self {
        Self {
            sites: Arc::new(
                sites
                    .into_iter()
                    .map(|(slug, site)| (slug.to_string(), site))
                    .collect(),
            ),
            stats: Arc::new(FakeStats::default()),
        }
    }

    pub fn single(slug: &str, site: FakeSite) -> Self {
        Self::new(vec![(slug, site)])
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>, DriverError> {
        self.stats.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeDriver {
            sites: self.sites.clone(),
            stats: self.stats.clone(),
            site: None,
            current: 0,
            inert_remaining: 0,
            gap_remaining: 0,
            closed: false,
        }))
    }
}

/// 快速超时的导航参数
pub fn fast_navigator_settings(advance_retries: u32) -> NavigatorSettings {
    NavigatorSettings {
        base_url: "https://skolmaten.se".to_string(),
        ready_selector: CONTAINER.to_string(),
        week_indicator_selector: TITLE.to_string(),
        next_week_labels: vec!["Nästa vecka".to_string()],
        page_load_timeout: Duration::from_millis(200),
        navigation_timeout: Duration::from_millis(100),
        control_timeout: Duration::from_millis(20),
        poll_interval: Duration::from_millis(10),
        retry_policy: RetryPolicy {
            max_retries: advance_retries,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(20),
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
            exponential_backoff: true,
            enable_jitter: false,
        },
    }
}

pub fn monday_week_43() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

pub fn school(slug: &str) -> School {
    School::new(format!("Skola {}", slug), slug)
}

pub fn fixed_clock(today: NaiveDate) -> Arc<dyn Clock> {
    Arc::new(FixedClock::at_noon(today))
}

/// 用假浏览器组装日历聚合服务
pub fn aggregator(
    launcher: Arc<FakeLauncher>,
    today: NaiveDate,
    advance_retries: u32,
) -> CalendarAggregator {
    let extractor = DayExtractor::new(
        CONTAINER,
        Default::default(),
        Arc::new(Default::default()),
    );
    CalendarAggregator::new(
        launcher,
        fast_navigator_settings(advance_retries),
        extractor,
        fixed_clock(today),
    )
}
