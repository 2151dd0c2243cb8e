// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::School;
use crate::engines::traits::{BrowserDriver, BrowserLauncher, ControlOutcome};
use crate::utils::errors::{DriverError, NavigationError};
use crate::utils::retry_policy::RetryPolicy;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// 导航参数
#[derive(Debug, Clone)]
pub struct NavigatorSettings {
    /// 站点根地址
    pub base_url: String,
    /// 页面就绪时必须出现的元素（菜单容器）
    pub ready_selector: String,
    /// 显示当前周的元素
    pub week_indicator_selector: String,
    /// "下一周" 控件的文字
    pub next_week_labels: Vec<String>,
    /// 页面加载超时
    pub page_load_timeout: Duration,
    /// 点击后等待周标题变化的超时
    pub navigation_timeout: Duration,
    /// 查找 "下一周" 控件的超时
    pub control_timeout: Duration,
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 点击无响应时的重试策略
    pub retry_policy: RetryPolicy,
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        Self {
            base_url: "https://skolmaten.se".to_string(),
            ready_selector: "#menu-container".to_string(),
            week_indicator_selector: ".text-2xl.font-semibold".to_string(),
            next_week_labels: vec!["Nästa vecka".to_string(), "Next week".to_string()],
            page_load_timeout: Duration::from_secs(10),
            navigation_timeout: Duration::from_secs(5),
            control_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(250),
            retry_policy: RetryPolicy::none(),
        }
    }
}

/// 翻页无法继续的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StuckReason {
    /// 页面上没有 "下一周" 控件
    ControlMissing,
    /// 控件被禁用
    ControlDisabled,
    /// 点击后周标题没有变化
    Unresponsive,
}

/// 周标题的读取来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorSource {
    /// 周标题元素
    Title,
    /// 页面上没有周标题元素，用菜单容器的文本代替
    Content,
}

/// 导航状态机
///
/// `Opening -> AtWeek(n) -> Advancing -> AtWeek(n+1) | Stuck`，关闭后进入 `Closed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigatorState {
    /// 会话已启动，页面尚未就绪
    Opening,
    /// 停留在第 `index` 周（从 0 开始），`indicator` 为页面上的周标题
    AtWeek { index: u32, indicator: String },
    /// 已点击 "下一周"，正在等待周标题变化
    Advancing { from: u32, indicator: String },
    /// 无法继续向后翻页
    Stuck { index: u32, reason: StuckReason },
    /// 会话已释放
    Closed,
}

/// 页面导航器
///
/// 拥有单个学校的浏览器会话，逐周向后翻页并在每次翻页后确认页面确实变化。
pub struct PageNavigator {
    driver: Box<dyn BrowserDriver>,
    settings: NavigatorSettings,
    state: NavigatorState,
    /// 周标题来自哪里，翻页后只与同一来源比较
    indicator_source: IndicatorSource,
}

impl PageNavigator {
    /// 打开学校的菜单页面
    ///
    /// 启动浏览器会话并加载 `{base_url}/{slug}`，在超时内等待菜单容器出现。
    /// 加载失败时会话会被立即释放。
    pub async fn open(
        launcher: &dyn BrowserLauncher,
        school: &School,
        settings: NavigatorSettings,
    ) -> Result<Self, NavigationError> {
        let url = school.menu_url(&settings.base_url)?;
        let driver = launcher.launch().await?;
        let mut navigator = Self {
            driver,
            settings,
            state: NavigatorState::Opening,
            indicator_source: IndicatorSource::Title,
        };

        match navigator.load(url.as_str()).await {
            Ok(()) => Ok(navigator),
            Err(e) => {
                navigator.close().await;
                Err(e)
            }
        }
    }

    async fn load(&mut self, url: &str) -> Result<(), NavigationError> {
        info!("Navigating to: {}", url);
        self.driver
            .load(url, &self.settings.ready_selector, self.settings.page_load_timeout)
            .await
            .map_err(|source| NavigationError::PageLoad {
                url: url.to_string(),
                source,
            })?;

        let (indicator, source) = self.week_indicator().await?;
        info!(week = %indicator, ?source, "Menu calendar rendered");
        self.indicator_source = source;
        self.state = NavigatorState::AtWeek {
            index: 0,
            indicator,
        };
        Ok(())
    }

    /// 向后翻一周
    ///
    /// 返回 `true` 表示页面已确认翻到下一周；控件不存在或被禁用时返回 `false`，
    /// 这是正常的终止条件而不是错误。点击后周标题在超时内没有变化会按重试策略
    /// 重新点击，仍然不变时返回 `NavigationError::AdvanceTimeout`。
    pub async fn advance(&mut self) -> Result<bool, NavigationError> {
        let (index, indicator) = match &self.state {
            NavigatorState::AtWeek { index, indicator } => (*index, indicator.clone()),
            NavigatorState::Stuck { .. } => return Ok(false),
            NavigatorState::Closed | NavigatorState::Opening => {
                return Err(NavigationError::Driver(DriverError::Closed))
            }
            NavigatorState::Advancing { from, .. } => {
                return Err(NavigationError::Driver(DriverError::Other(format!(
                    "advance from week {} still in progress",
                    from
                ))))
            }
        };

        let mut attempt = 0;
        loop {
            let outcome = self
                .driver
                .click_control(&self.settings.next_week_labels, self.settings.control_timeout)
                .await?;

            match outcome {
                ControlOutcome::Missing => {
                    info!("No next week control on page, staying at week {}", index);
                    self.state = NavigatorState::Stuck {
                        index,
                        reason: StuckReason::ControlMissing,
                    };
                    return Ok(false);
                }
                ControlOutcome::Disabled => {
                    info!("Next week control is disabled, staying at week {}", index);
                    self.state = NavigatorState::Stuck {
                        index,
                        reason: StuckReason::ControlDisabled,
                    };
                    return Ok(false);
                }
                ControlOutcome::Clicked => {}
            }

            self.state = NavigatorState::Advancing {
                from: index,
                indicator: indicator.clone(),
            };

            if let Some(new_indicator) = self.wait_for_indicator_change(&indicator).await? {
                debug!(from = %indicator, to = %new_indicator, "Advanced to next week");
                self.state = NavigatorState::AtWeek {
                    index: index + 1,
                    indicator: new_indicator,
                };
                return Ok(true);
            }

            if !self.settings.retry_policy.should_retry(attempt) {
                warn!(
                    "Week indicator '{}' unchanged after {} click(s)",
                    indicator,
                    attempt + 1
                );
                self.state = NavigatorState::Stuck {
                    index,
                    reason: StuckReason::Unresponsive,
                };
                return Err(NavigationError::AdvanceTimeout(
                    self.settings.navigation_timeout,
                ));
            }

            attempt += 1;
            let backoff = self.settings.retry_policy.calculate_backoff(attempt);
            warn!(
                "Next week click had no effect, retrying in {:?} (attempt {})",
                backoff, attempt
            );
            self.state = NavigatorState::AtWeek {
                index,
                indicator: indicator.clone(),
            };
            sleep(backoff).await;
        }
    }

    /// 轮询周标题直到与 `previous` 不同，超时返回 `None`
    ///
    /// 只读取与翻页前相同来源的标题：标题元素暂时消失时视为尚未变化，
    /// 不会拿旧的菜单文本和旧标题比较。
    async fn wait_for_indicator_change(
        &mut self,
        previous: &str,
    ) -> Result<Option<String>, NavigationError> {
        let deadline = Instant::now() + self.settings.navigation_timeout;
        loop {
            // The container must be back before the new week counts as rendered.
            let ready = self
                .driver
                .read_text(&self.settings.ready_selector)
                .await?
                .is_some();
            if ready {
                match self.read_indicator(self.indicator_source).await? {
                    Some(current) if current != previous => return Ok(Some(current)),
                    Some(_) => {}
                    None => debug!("Week indicator not rendered yet"),
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(self.settings.poll_interval).await;
        }
    }

    /// 页面就绪后确定周标题及其来源
    async fn week_indicator(&mut self) -> Result<(String, IndicatorSource), NavigationError> {
        if let Some(title) = self.read_indicator(IndicatorSource::Title).await? {
            return Ok((title, IndicatorSource::Title));
        }

        // Without a week title the rendered menu itself identifies the week.
        debug!("Week title element not found, falling back to menu content");
        let content = self
            .read_indicator(IndicatorSource::Content)
            .await?
            .unwrap_or_default();
        Ok((content, IndicatorSource::Content))
    }

    async fn read_indicator(
        &mut self,
        source: IndicatorSource,
    ) -> Result<Option<String>, NavigationError> {
        let selector = match source {
            IndicatorSource::Title => &self.settings.week_indicator_selector,
            IndicatorSource::Content => &self.settings.ready_selector,
        };
        Ok(self
            .driver
            .read_text(selector)
            .await?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }

    /// 当前页面的会话，供日期提取器读取内容
    pub fn session(&mut self) -> &mut dyn BrowserDriver {
        self.driver.as_mut()
    }

    pub fn state(&self) -> &NavigatorState {
        &self.state
    }

    pub fn indicator_source(&self) -> IndicatorSource {
        self.indicator_source
    }

    /// 当前周标题
    pub fn indicator(&self) -> Option<&str> {
        match &self.state {
            NavigatorState::AtWeek { indicator, .. } => Some(indicator),
            NavigatorState::Advancing { indicator, .. } => Some(indicator),
            _ => None,
        }
    }

    /// 释放浏览器资源，可重复调用
    pub async fn close(&mut self) {
        if self.state == NavigatorState::Closed {
            return;
        }
        if let Err(e) = self.driver.close().await {
            warn!("Failed to close {} session cleanly: {}", self.driver.name(), e);
        }
        self.state = NavigatorState::Closed;
    }
}
