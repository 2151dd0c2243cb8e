// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::WorkerError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Worker trait定义
///
/// 后台工作器在 `shutdown` 被取消之前持续运行
#[async_trait]
pub trait Worker: Send + Sync {
    /// 运行工作器直到收到关闭信号
    async fn run(&self, shutdown: CancellationToken) -> Result<(), WorkerError>;

    /// 获取工作器名称
    fn name(&self) -> &str;
}
