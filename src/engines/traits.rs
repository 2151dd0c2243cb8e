// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::utils::errors::DriverError;
use async_trait::async_trait;
use std::time::Duration;

/// 点击控件的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    /// 找到并点击了控件
    Clicked,
    /// 控件存在但被禁用
    Disabled,
    /// 页面上没有该控件
    Missing,
}

/// 浏览器驱动特质
///
/// 抓取核心只依赖这几项操作：加载页面并等待就绪、点击可识别的控件、
/// 读取渲染后的元素文本，以及释放资源。
#[async_trait]
pub trait BrowserDriver: Send {
    /// 加载URL，并等待 `ready_selector` 对应的元素出现
    async fn load(
        &mut self,
        url: &str,
        ready_selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    /// 查找文字匹配 `labels` 之一（不区分大小写）的控件并点击
    async fn click_control(
        &mut self,
        labels: &[String],
        timeout: Duration,
    ) -> Result<ControlOutcome, DriverError>;

    /// 读取元素渲染后的文本，元素不存在时返回 `None`
    async fn read_text(&mut self, selector: &str) -> Result<Option<String>, DriverError>;

    /// 释放浏览器资源，可重复调用
    async fn close(&mut self) -> Result<(), DriverError>;

    /// 驱动名称
    fn name(&self) -> &'static str;
}

/// 浏览器启动器特质
///
/// 每次调用创建一个独立的浏览器会话，会话归调用方独占
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>, DriverError>;
}
