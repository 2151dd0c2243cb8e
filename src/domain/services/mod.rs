// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 日历聚合（calendar_service）：逐周抓取并合并成菜单日历
/// - 菜品过滤（course_filter）：区分菜品和公告文字
/// - 传感器发布（sensor_publisher）：把抓取结果转换为传感器记录
pub mod calendar_service;
pub mod course_filter;
pub mod sensor_publisher;
