// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use thiserror::Error;

/// 配置错误类型
///
/// 在任何浏览器工作开始之前被检测，属于致命错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("weeks must be within 1..=10, got {0}")]
    WeeksOutOfRange(u32),

    #[error("malformed school entry: {0}")]
    MalformedSchool(String),

    #[error("invalid SCHOOLS json: {0}")]
    SchoolsJson(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<validator::ValidationErrors> for ConfigError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ConfigError::Invalid(errors.to_string())
    }
}

/// 浏览器驱动错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 浏览器启动或连接失败
    #[error("browser launch failed: {0}")]
    Launch(String),
    /// 等待超时
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// 会话已关闭
    #[error("browser session already closed")]
    Closed,
    /// 其他错误
    #[error("driver error: {0}")]
    Other(String),
}

/// 页面导航错误类型
#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("page {url} did not render the menu calendar: {source}")]
    PageLoad {
        url: String,
        #[source]
        source: DriverError,
    },

    #[error("week indicator did not change within {0:?} after clicking next week")]
    AdvanceTimeout(Duration),

    #[error("navigation failed: {0}")]
    Driver(#[from] DriverError),

    #[error("invalid school url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// 内容提取错误类型
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("menu container `{0}` is not present on the page")]
    ContainerMissing(String),

    #[error("day blocks found but none of them carries a date")]
    MissingDates,

    #[error("unparseable date `{0}`")]
    InvalidDate(String),

    #[error("page still shows days up to {0} after advancing")]
    StaleWeek(chrono::NaiveDate),

    #[error("extraction failed: {0}")]
    Driver(#[from] DriverError),
}

/// 单个学校抓取过程中的错误
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// 传感器发布错误类型
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("home assistant rejected {entity_id} with status {status}: {body}")]
    Rejected {
        entity_id: String,
        status: u16,
        body: String,
    },

    #[error("invalid home assistant url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}
