// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

/// 学校实体
///
/// 标识一个抓取目标。`slug` 既用于拼接菜单页面URL，
/// 也用于生成传感器实体ID。由配置提供，运行期间不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct School {
    /// 学校显示名称
    #[validate(length(min = 1, message = "school name cannot be empty"))]
    pub name: String,
    /// 页面路径标识，例如 `svenstorps-forskola`
    #[validate(length(min = 1, message = "school slug cannot be empty"))]
    pub slug: String,
}

impl School {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
        }
    }

    /// 菜单页面地址
    pub fn menu_url(&self, base_url: &str) -> Result<Url, url::ParseError> {
        let base = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };
        base.join(self.slug.trim_matches('/'))
    }

    /// Home Assistant 传感器实体ID
    pub fn entity_id(&self) -> String {
        format!("sensor.skolmaten_{}", self.slug.replace('-', "_"))
    }
}
