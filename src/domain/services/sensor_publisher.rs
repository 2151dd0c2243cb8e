// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{ScrapeResult, ScrapeStatus};
use crate::utils::errors::PublishError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// 传感器状态的最大字符数
pub const STATE_MAX_CHARS: usize = 255;

pub const ICON_MENU: &str = "mdi:food";
pub const ICON_NO_MENU: &str = "mdi:food-off";
pub const ICON_ERROR: &str = "mdi:alert-circle";

/// 一个学校对应的传感器记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorRecord {
    /// 实体ID，例如 `sensor.skolmaten_hovagens_forskola`
    #[serde(skip)]
    pub entity_id: String,
    /// 今日菜品，以 `", "` 连接
    pub state: String,
    /// 附加属性
    pub attributes: Value,
}

impl SensorRecord {
    /// 由抓取结果生成传感器记录
    pub fn from_result(result: &ScrapeResult) -> Self {
        let state = result
            .today
            .as_ref()
            .map(|today| truncate_chars(&today.courses.join(", "), STATE_MAX_CHARS))
            .unwrap_or_default();

        let icon = match (result.status, &result.today) {
            (ScrapeStatus::Failure, _) => ICON_ERROR,
            (_, Some(today)) if !today.courses.is_empty() => ICON_MENU,
            _ => ICON_NO_MENU,
        };

        let today = result.today.as_ref();
        let mut attributes = Map::new();
        attributes.insert("friendly_name".into(), json!(result.school.name));
        attributes.insert("icon".into(), json!(icon));
        attributes.insert("today_date".into(), json!(today.map(|t| t.date)));
        attributes.insert("today_weekday".into(), json!(today.map(|t| &t.weekday)));
        attributes.insert("today_week".into(), json!(today.map(|t| t.week)));
        attributes.insert(
            "today_courses".into(),
            json!(today.map(|t| t.courses.clone()).unwrap_or_default()),
        );
        attributes.insert(
            "courses_count".into(),
            json!(today.map(|t| t.courses_count).unwrap_or(0)),
        );
        attributes.insert("calendar".into(), json!(result.calendar));
        attributes.insert("last_updated".into(), json!(result.last_updated.to_rfc3339()));
        attributes.insert("status".into(), json!(result.status));
        if let Some(error) = &result.error {
            attributes.insert("error".into(), json!(error));
        }

        Self {
            entity_id: result.school.entity_id(),
            state,
            attributes: Value::Object(attributes),
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// 传感器发布特质
#[async_trait]
pub trait SensorPublisher: Send + Sync {
    /// 创建或更新一个传感器
    async fn publish(&self, record: &SensorRecord) -> Result<(), PublishError>;

    /// 发布器名称
    fn name(&self) -> &'static str;
}
