// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Local, NaiveDate, TimeZone};

/// 时钟特质
///
/// 用于确定"今天"以及结果的更新时间，测试中可替换为固定时钟
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// 系统本地时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// 固定时钟
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl FixedClock {
    /// 固定在某一天的中午
    pub fn at_noon(date: NaiveDate) -> Self {
        let naive = date.and_hms_opt(12, 0, 0).unwrap_or_default();
        let local = Local
            .from_local_datetime(&naive)
            .earliest()
            .unwrap_or_else(Local::now);
        Self(local)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}
