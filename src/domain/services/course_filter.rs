// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 默认的公告短语黑名单
pub const DEFAULT_BLACKLIST: &[&str] = &["Med reservation"];

/// 默认的单行最大字符数
pub const DEFAULT_MAX_LINE_LENGTH: usize = 200;

/// 被判定为非菜品的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseReason {
    /// 空行或只有空白
    Empty,
    /// 超过最大长度
    TooLong,
    /// 命中黑名单短语
    Blacklisted,
}

/// 单行文本的分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// 菜品，携带去除首尾空白后的文本
    Course(String),
    /// 公告或噪声
    Noise(NoiseReason),
}

impl Classification {
    pub fn into_course(self) -> Option<String> {
        match self {
            Classification::Course(text) => Some(text),
            Classification::Noise(_) => None,
        }
    }
}

/// 菜品过滤器
///
/// 纯函数式、无状态：结果只取决于输入文本和构造时的配置。
/// 规则按顺序匹配，先命中者生效：
/// 1. 空行 → 噪声
/// 2. 超长或命中黑名单（不区分大小写的子串匹配）→ 噪声
/// 3. 其余一律视为菜品
///
/// 无法分类的文本默认保留，宁可多收也不误删。
#[derive(Debug, Clone)]
pub struct CourseFilter {
    max_line_length: usize,
    /// 已转为小写的黑名单
    blacklist: Vec<String>,
}

impl Default for CourseFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_LINE_LENGTH,
            DEFAULT_BLACKLIST.iter().map(|s| s.to_string()),
        )
    }
}

impl CourseFilter {
    /// 创建过滤器
    ///
    /// # 参数
    ///
    /// * `max_line_length` - 单行最大字符数
    /// * `blacklist` - 公告短语，空白短语会被忽略
    pub fn new<I, S>(max_line_length: usize, blacklist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let blacklist = blacklist
            .into_iter()
            .map(|phrase| phrase.as_ref().trim().to_lowercase())
            .filter(|phrase| !phrase.is_empty())
            .collect();

        Self {
            max_line_length,
            blacklist,
        }
    }

    /// 对一行文本进行分类
    pub fn classify(&self, line: &str) -> Classification {
        let text = line.trim();
        if text.is_empty() {
            return Classification::Noise(NoiseReason::Empty);
        }

        if text.chars().count() > self.max_line_length {
            return Classification::Noise(NoiseReason::TooLong);
        }

        let lowered = text.to_lowercase();
        if self
            .blacklist
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
        {
            return Classification::Noise(NoiseReason::Blacklisted);
        }

        Classification::Course(text.to_string())
    }
}
