// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::calendar::Calendar;
use super::day_menu::DayMenu;
use super::school::School;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 抓取状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    /// 获取了全部请求的周
    Ok,
    /// 只获取了部分周（数据已到尽头、后续周出错或被取消）
    PartialFailure,
    /// 没有可用数据
    Failure,
}

impl fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeStatus::Ok => write!(f, "ok"),
            ScrapeStatus::PartialFailure => write!(f, "partial_failure"),
            ScrapeStatus::Failure => write!(f, "failure"),
        }
    }
}

/// 今日视图
///
/// 从日历中派生，不单独存储
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayView {
    pub date: NaiveDate,
    pub weekday: String,
    pub week: u32,
    pub courses: Vec<String>,
    pub courses_count: usize,
}

impl TodayView {
    /// 在日历中查找今天的菜单
    pub fn for_date(calendar: &Calendar, today: NaiveDate) -> Option<Self> {
        calendar.find_date(today).map(Self::from)
    }
}

impl From<&DayMenu> for TodayView {
    fn from(day: &DayMenu) -> Self {
        Self {
            date: day.date,
            weekday: day.weekday.clone(),
            week: day.week,
            courses: day.courses.clone(),
            courses_count: day.courses.len(),
        }
    }
}

/// 单个学校一次运行的抓取结果
///
/// 每次运行从头重新计算，没有持久化标识。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    /// 抓取目标
    pub school: School,
    /// 周索引的菜单日历
    pub calendar: Calendar,
    /// 今日菜单；今天没有日块时为空
    pub today: Option<TodayView>,
    /// 抓取完成时间
    pub last_updated: DateTime<Local>,
    /// 抓取状态
    pub status: ScrapeStatus,
    /// 请求的周数
    pub weeks_requested: u32,
    /// 实际访问成功的周数
    pub weeks_collected: u32,
    /// 导致失败或部分失败的原因
    pub error: Option<String>,
}

impl ScrapeResult {
    /// 创建一个没有任何数据的失败结果
    pub fn failure(
        school: School,
        weeks_requested: u32,
        error: impl Into<String>,
        last_updated: DateTime<Local>,
    ) -> Self {
        Self {
            school,
            calendar: Calendar::new(),
            today: None,
            last_updated,
            status: ScrapeStatus::Failure,
            weeks_requested,
            weeks_collected: 0,
            error: Some(error.into()),
        }
    }
}
