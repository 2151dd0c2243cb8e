// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 学校编排器以及按固定间隔触发抓取和发布的后台工作器
pub mod orchestrator;
pub mod update_worker;
pub mod worker;

pub use worker::Worker;
