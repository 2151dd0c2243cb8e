// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含菜单模型和抓取相关的领域服务
pub mod domain;

/// 引擎模块
///
/// 浏览器驱动、翻页导航和单日菜单提取
pub mod engines;

/// 基础设施模块
///
/// 提供 Home Assistant 发布和指标等外部集成
pub mod infrastructure;

/// 工具模块
///
/// 提供错误类型、重试策略、时钟和日志初始化
pub mod utils;

/// 工作器模块
///
/// 学校编排和定时更新
pub mod workers;
