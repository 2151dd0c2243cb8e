// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::day_menu::DayMenu;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 菜单日历
///
/// 以 ISO 周数为键的单日菜单映射，对外序列化时键为字符串。
///
/// 不变量：
/// - 同一 `(week, date)` 不会出现两次
/// - 每周最多 7 条
/// - 周内按日期严格升序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Calendar {
    weeks: BTreeMap<u32, Vec<DayMenu>>,
}

impl Calendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入单日菜单
    ///
    /// 按日期有序插入到所属周中。若该日期已存在，新值覆盖旧值
    /// 并返回被替换的条目。
    pub fn insert(&mut self, day: DayMenu) -> Option<DayMenu> {
        let days = self.weeks.entry(day.week).or_default();
        match days.binary_search_by(|existing| existing.date.cmp(&day.date)) {
            Ok(pos) => Some(std::mem::replace(&mut days[pos], day)),
            Err(pos) => {
                days.insert(pos, day);
                None
            }
        }
    }

    /// 获取某周的菜单
    pub fn week(&self, week: u32) -> Option<&[DayMenu]> {
        self.weeks.get(&week).map(Vec::as_slice)
    }

    /// 按周数升序遍历
    pub fn weeks(&self) -> impl Iterator<Item = (u32, &[DayMenu])> {
        self.weeks.iter().map(|(week, days)| (*week, days.as_slice()))
    }

    /// 遍历所有单日菜单
    pub fn days(&self) -> impl Iterator<Item = &DayMenu> {
        self.weeks.values().flatten()
    }

    /// 查找指定日期的菜单
    pub fn find_date(&self, date: NaiveDate) -> Option<&DayMenu> {
        self.days().find(|day| day.date == date)
    }

    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }

    pub fn day_count(&self) -> usize {
        self.weeks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }
}
