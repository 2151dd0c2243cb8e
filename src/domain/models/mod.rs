// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 学校（school）：一个抓取目标
/// - 单日菜单（day_menu）：某一天的菜品及日期信息
/// - 日历（calendar）：以周数索引的单日菜单集合
/// - 抓取结果（scrape_result）：一次运行针对一个学校的完整输出
pub mod calendar;
pub mod day_menu;
pub mod scrape_result;
pub mod school;

pub use calendar::Calendar;
pub use day_menu::{DayMenu, WeekdayLocale};
pub use scrape_result::{ScrapeResult, ScrapeStatus, TodayView};
pub use school::School;
