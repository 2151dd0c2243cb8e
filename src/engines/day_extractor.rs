// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{DayMenu, WeekdayLocale};
use crate::domain::services::course_filter::{Classification, CourseFilter};
use crate::engines::traits::BrowserDriver;
use crate::utils::errors::ExtractionError;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

static DATE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Failed to compile date regex"));

static DATE_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("Failed to compile date regex"));

/// Rendered text shorter than this usually means the menu never loaded.
const SHORT_CONTENT_CHARS: usize = 50;

const WEEKDAY_LABELS: &[(&str, Weekday)] = &[
    ("måndag", Weekday::Mon),
    ("tisdag", Weekday::Tue),
    ("onsdag", Weekday::Wed),
    ("torsdag", Weekday::Thu),
    ("fredag", Weekday::Fri),
    ("lördag", Weekday::Sat),
    ("söndag", Weekday::Sun),
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

/// 页面上的一个日块
#[derive(Debug)]
struct DayBlock {
    label: Weekday,
    date: Option<NaiveDate>,
    courses: Vec<String>,
}

/// 日期提取器
///
/// 从当前显示的周页面中读取每个日块的日期和菜品
#[derive(Debug, Clone)]
pub struct DayExtractor {
    container_selector: String,
    locale: WeekdayLocale,
    filter: Arc<CourseFilter>,
}

impl DayExtractor {
    pub fn new(
        container_selector: impl Into<String>,
        locale: WeekdayLocale,
        filter: Arc<CourseFilter>,
    ) -> Self {
        Self {
            container_selector: container_selector.into(),
            locale,
            filter,
        }
    }

    /// 提取当前周的所有单日菜单
    ///
    /// 菜单容器不存在属于页面结构无法识别，返回错误；
    /// 某一天缺失（周末、假期）不是错误。
    pub async fn extract_days(
        &self,
        session: &mut dyn BrowserDriver,
    ) -> Result<Vec<DayMenu>, ExtractionError> {
        let text = session
            .read_text(&self.container_selector)
            .await?
            .ok_or_else(|| ExtractionError::ContainerMissing(self.container_selector.clone()))?;

        info!("Menu container text length: {} characters", text.len());
        if text.chars().count() < SHORT_CONTENT_CHARS {
            warn!("Menu container text is very short: '{}'", text.trim());
        }

        self.parse_week(&text)
    }

    /// 解析菜单容器的文本
    pub fn parse_week(&self, text: &str) -> Result<Vec<DayMenu>, ExtractionError> {
        let mut blocks: Vec<DayBlock> = Vec::new();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(label) = weekday_label(line) {
                let date = DATE_ANYWHERE
                    .captures(line)
                    .map(|c| parse_date(&c[1]))
                    .transpose()?;
                debug!("Found day: '{}'", line);
                blocks.push(DayBlock {
                    label,
                    date,
                    courses: Vec::new(),
                });
                continue;
            }

            // Anything before the first day header is page chrome.
            let Some(block) = blocks.last_mut() else {
                continue;
            };

            if DATE_LINE.is_match(line) {
                if block.date.is_none() {
                    block.date = Some(parse_date(line)?);
                }
                continue;
            }

            match self.filter.classify(line) {
                Classification::Course(course) => block.courses.push(course),
                Classification::Noise(reason) => {
                    debug!(?reason, "Skipping non-course line: '{}'", line)
                }
            }
        }

        if blocks.is_empty() {
            info!("No day blocks on page");
            return Ok(Vec::new());
        }

        let anchor = blocks
            .iter()
            .find_map(|b| b.date)
            .ok_or(ExtractionError::MissingDates)?;

        let days = blocks
            .into_iter()
            .map(|block| {
                let date = block.date.unwrap_or_else(|| infer_date(anchor, block.label));
                if date.weekday() != block.label {
                    debug!(
                        "Day label {:?} does not match date {}, using the date",
                        block.label, date
                    );
                }
                if block.courses.is_empty() {
                    warn!("No menu items found for {}", date);
                }
                DayMenu::new(date, block.courses, self.locale)
            })
            .collect::<Vec<_>>();

        info!("Menu parsing completed. Found {} days", days.len());
        Ok(days)
    }
}

/// 判断一行是否为日块标题：第一个词是星期名称
fn weekday_label(line: &str) -> Option<Weekday> {
    let first = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .next()?
        .trim_end_matches(|c: char| c == ':' || c == '.')
        .to_lowercase();

    WEEKDAY_LABELS
        .iter()
        .find(|(name, _)| *name == first)
        .map(|(_, weekday)| *weekday)
}

fn parse_date(raw: &str) -> Result<NaiveDate, ExtractionError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ExtractionError::InvalidDate(raw.to_string()))
}

/// 用同页上已知日期推算缺失日期
fn infer_date(anchor: NaiveDate, label: Weekday) -> NaiveDate {
    let offset = label.num_days_from_monday() as i64 - anchor.weekday().num_days_from_monday() as i64;
    anchor + Duration::days(offset)
}
