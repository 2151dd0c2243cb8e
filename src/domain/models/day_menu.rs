// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// 星期名称的语言
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekdayLocale {
    /// 瑞典语（站点默认语言）
    #[default]
    Sv,
    /// 英语
    En,
}

impl WeekdayLocale {
    /// 返回给定星期的显示名称
    pub fn name(self, weekday: Weekday) -> &'static str {
        match (self, weekday) {
            (WeekdayLocale::Sv, Weekday::Mon) => "Måndag",
            (WeekdayLocale::Sv, Weekday::Tue) => "Tisdag",
            (WeekdayLocale::Sv, Weekday::Wed) => "Onsdag",
            (WeekdayLocale::Sv, Weekday::Thu) => "Torsdag",
            (WeekdayLocale::Sv, Weekday::Fri) => "Fredag",
            (WeekdayLocale::Sv, Weekday::Sat) => "Lördag",
            (WeekdayLocale::Sv, Weekday::Sun) => "Söndag",
            (WeekdayLocale::En, Weekday::Mon) => "Monday",
            (WeekdayLocale::En, Weekday::Tue) => "Tuesday",
            (WeekdayLocale::En, Weekday::Wed) => "Wednesday",
            (WeekdayLocale::En, Weekday::Thu) => "Thursday",
            (WeekdayLocale::En, Weekday::Fri) => "Friday",
            (WeekdayLocale::En, Weekday::Sat) => "Saturday",
            (WeekdayLocale::En, Weekday::Sun) => "Sunday",
        }
    }
}

/// 单日菜单
///
/// 由日期提取器为每个页面上出现的日块创建。`weekday` 与 `week`
/// 都由 `date` 推导，而不是读取页面文字。
/// 字段顺序即序列化顺序：`{weekday, date, week, courses}`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayMenu {
    /// 星期名称
    pub weekday: String,
    /// 日期，序列化为 `YYYY-MM-DD`
    pub date: NaiveDate,
    /// ISO 周数（1–53）
    pub week: u32,
    /// 菜品列表，保持页面顺序；为空表示当日未发布菜单
    pub courses: Vec<String>,
}

impl DayMenu {
    /// 根据日期创建单日菜单
    pub fn new(date: NaiveDate, courses: Vec<String>, locale: WeekdayLocale) -> Self {
        Self {
            weekday: locale.name(date.weekday()).to_string(),
            date,
            week: date.iso_week().week(),
            courses,
        }
    }
}
