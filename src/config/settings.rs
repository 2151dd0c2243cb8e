// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::{School, WeekdayLocale};
use crate::domain::services::course_filter::{
    CourseFilter, DEFAULT_BLACKLIST, DEFAULT_MAX_LINE_LENGTH,
};
use crate::engines::day_extractor::DayExtractor;
use crate::engines::navigator::NavigatorSettings;
use crate::utils::errors::ConfigError;
use crate::utils::retry_policy::RetryPolicy;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

/// 允许抓取的最大周数
pub const MAX_WEEKS: u32 = 10;

/// 应用程序配置设置
///
/// 包含学校列表、抓取范围、浏览器、Home Assistant、日志和指标等所有配置项
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    /// 要抓取的学校
    #[serde(default)]
    pub schools: Vec<School>,
    /// 每个学校抓取的周数（1..=10）
    pub weeks: u32,
    /// 更新间隔（秒）
    #[validate(range(min = 1))]
    pub update_interval: u64,
    /// 公告短语黑名单
    #[serde(default = "default_blacklist")]
    pub course_blacklist: Vec<String>,
    /// 单行菜品最大字符数
    #[validate(range(min = 1))]
    pub max_course_length: usize,
    /// 星期名称语言
    #[serde(default)]
    pub weekday_locale: WeekdayLocale,
    /// 学校之间的间隔（毫秒）
    pub school_delay_ms: u64,
    /// 单次运行的总时限（秒），为空表示不限制
    pub run_deadline_secs: Option<u64>,
    /// 站点配置
    #[validate(nested)]
    pub site: SiteSettings,
    /// 浏览器配置
    #[validate(nested)]
    pub browser: BrowserSettings,
    /// Home Assistant 配置
    #[validate(nested)]
    pub home_assistant: HomeAssistantSettings,
    /// 日志配置
    pub logging: LoggingSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 站点配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SiteSettings {
    /// 站点根地址
    #[validate(url)]
    pub base_url: String,
    /// 菜单容器选择器
    #[validate(length(min = 1))]
    pub menu_container_selector: String,
    /// 周标题选择器
    #[validate(length(min = 1))]
    pub week_title_selector: String,
    /// "下一周" 按钮的文字
    #[validate(length(min = 1))]
    pub next_week_labels: Vec<String>,
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BrowserSettings {
    /// Chrome 可执行文件路径
    pub executable: Option<String>,
    /// 远程调试地址，设置后不再本地启动浏览器
    pub remote_debugging_url: Option<String>,
    /// 是否无头模式
    pub headless: bool,
    /// 页面加载超时（秒）
    #[validate(range(min = 1))]
    pub page_load_timeout_secs: u64,
    /// 点击后等待周标题变化的超时（秒）
    #[validate(range(min = 1))]
    pub navigation_timeout_secs: u64,
    /// 查找 "下一周" 控件的超时（毫秒）
    #[validate(range(min = 1))]
    pub control_timeout_ms: u64,
    /// 轮询间隔（毫秒）
    #[validate(range(min = 10))]
    pub poll_interval_ms: u64,
    /// 点击无响应时的重试次数
    #[validate(range(max = 5))]
    pub advance_retries: u32,
    /// 窗口宽度
    pub window_width: u32,
    /// 窗口高度
    pub window_height: u32,
    /// 自定义 User-Agent
    pub user_agent: Option<String>,
}

/// Home Assistant 配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HomeAssistantSettings {
    /// 是否发布传感器
    pub enabled: bool,
    /// Core API 地址
    #[validate(url)]
    pub url: String,
    /// 访问令牌
    pub token: Option<String>,
    /// 请求超时（秒）
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// 是否输出 JSON 格式
    pub json: bool,
    /// 默认过滤规则（`RUST_LOG` 优先）
    pub filter: String,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启动 Prometheus 导出器
    pub enabled: bool,
    /// 监听地址
    pub listen: String,
}

fn default_blacklist() -> Vec<String> {
    DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect()
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 加载顺序：默认值 → `config/default` → `config/{APP_ENVIRONMENT}` →
    /// `SKOLMATEN__*` 环境变量 → Home Assistant 插件的环境变量
    /// （`SCHOOLS`、`N_WEEKS`、`UPDATE_INTERVAL`、`SUPERVISOR_TOKEN`、
    /// `CHROME_BIN`、`CHROMIUM_REMOTE_DEBUGGING_URL`）。
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 加载并校验通过的配置
    /// * `Err(ConfigError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            .set_default("weeks", 1)?
            .set_default("update_interval", 3600)?
            .set_default("max_course_length", DEFAULT_MAX_LINE_LENGTH as i64)?
            .set_default("school_delay_ms", 2000)?
            // Site defaults
            .set_default("site.base_url", "https://skolmaten.se")?
            .set_default("site.menu_container_selector", "#menu-container")?
            .set_default("site.week_title_selector", ".text-2xl.font-semibold")?
            .set_default("site.next_week_labels", vec!["Nästa vecka", "Next week"])?
            // Browser defaults
            .set_default("browser.headless", true)?
            .set_default("browser.page_load_timeout_secs", 10)?
            .set_default("browser.navigation_timeout_secs", 5)?
            .set_default("browser.control_timeout_ms", 1000)?
            .set_default("browser.poll_interval_ms", 250)?
            .set_default("browser.advance_retries", 0)?
            .set_default("browser.window_width", 1920)?
            .set_default("browser.window_height", 1080)?
            // Home Assistant defaults
            .set_default("home_assistant.enabled", true)?
            .set_default("home_assistant.url", "http://supervisor/core")?
            .set_default("home_assistant.timeout_secs", 10)?
            // Observability defaults
            .set_default("logging.json", false)?
            .set_default("logging.filter", "info,skolmaten=debug")?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen", "0.0.0.0:9000")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("SKOLMATEN")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("course_blacklist")
                    .with_list_parse_key("site.next_week_labels")
                    .try_parsing(true),
            )
            // Home Assistant add-on environment
            .set_override_option("weeks", std::env::var("N_WEEKS").ok())?
            .set_override_option("update_interval", std::env::var("UPDATE_INTERVAL").ok())?
            .set_override_option("home_assistant.token", std::env::var("SUPERVISOR_TOKEN").ok())?
            .set_override_option("browser.executable", std::env::var("CHROME_BIN").ok())?
            .set_override_option(
                "browser.remote_debugging_url",
                std::env::var("CHROMIUM_REMOTE_DEBUGGING_URL").ok(),
            )?;

        let mut settings: Settings = builder.build()?.try_deserialize()?;

        if let Ok(raw) = std::env::var("SCHOOLS") {
            settings.schools = parse_schools(&raw)?;
        }

        settings.check()?;
        Ok(settings)
    }

    /// 校验配置
    ///
    /// 周数越界和学校条目不合法有专门的错误类型，其余字段走 `validator` 校验。
    pub fn check(&self) -> Result<(), ConfigError> {
        validate_weeks(self.weeks)?;
        for school in &self.schools {
            validate_school(school)?;
        }
        self.validate()?;
        Ok(())
    }

    /// 按配置构造菜品过滤器
    pub fn course_filter(&self) -> Arc<CourseFilter> {
        Arc::new(CourseFilter::new(
            self.max_course_length,
            &self.course_blacklist,
        ))
    }

    /// 按配置构造导航参数
    pub fn navigator_settings(&self) -> NavigatorSettings {
        NavigatorSettings {
            base_url: self.site.base_url.clone(),
            ready_selector: self.site.menu_container_selector.clone(),
            week_indicator_selector: self.site.week_title_selector.clone(),
            next_week_labels: self.site.next_week_labels.clone(),
            page_load_timeout: Duration::from_secs(self.browser.page_load_timeout_secs),
            navigation_timeout: Duration::from_secs(self.browser.navigation_timeout_secs),
            control_timeout: Duration::from_millis(self.browser.control_timeout_ms),
            poll_interval: Duration::from_millis(self.browser.poll_interval_ms),
            retry_policy: RetryPolicy::for_advance(self.browser.advance_retries),
        }
    }

    /// 按配置构造日期提取器
    pub fn day_extractor(&self) -> DayExtractor {
        DayExtractor::new(
            self.site.menu_container_selector.clone(),
            self.weekday_locale,
            self.course_filter(),
        )
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval)
    }

    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline_secs.map(Duration::from_secs)
    }
}

/// 校验周数范围
pub fn validate_weeks(weeks: u32) -> Result<(), ConfigError> {
    if (1..=MAX_WEEKS).contains(&weeks) {
        Ok(())
    } else {
        Err(ConfigError::WeeksOutOfRange(weeks))
    }
}

/// 校验单个学校条目
pub fn validate_school(school: &School) -> Result<(), ConfigError> {
    school.validate().map_err(|e| {
        ConfigError::MalformedSchool(format!("{:?} ({}): {}", school.name, school.slug, e))
    })
}

/// 解析 `SCHOOLS` 环境变量中的 JSON 学校列表
pub fn parse_schools(raw: &str) -> Result<Vec<School>, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    let schools: Vec<School> = serde_json::from_str(raw)?;
    for school in &schools {
        validate_school(school)?;
    }
    Ok(schools)
}
