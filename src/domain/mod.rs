// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：学校、单日菜单、日历和抓取结果
/// - 服务（services）：菜品过滤、日历聚合和传感器记录
///
/// 领域层不依赖具体的浏览器或 HTTP 实现，只通过特质与它们交互。
pub mod models;
pub mod services;
