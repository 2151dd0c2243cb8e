// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块负责与外部系统的交互：
/// - Home Assistant（home_assistant）：传感器状态的 REST 发布
/// - 可观测性（observability）：Prometheus 指标
pub mod home_assistant;
pub mod observability;
