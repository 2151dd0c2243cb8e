// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 浏览器引擎模块
///
/// 浏览器驱动抽象、Chrome 实现、逐周翻页的导航器以及单日菜单提取
pub mod chromium_driver;
pub mod day_extractor;
pub mod navigator;
pub mod traits;
