// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{aggregator, monday_week_43, school, FakeLauncher, FakePage, FakeSite};
use chrono::{Duration, NaiveDate};
use skolmaten::domain::models::{ScrapeResult, ScrapeStatus};
use skolmaten::domain::services::sensor_publisher::SensorRecord;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

async fn build(
    site: FakeSite,
    today: NaiveDate,
    weeks: u32,
) -> (ScrapeResult, Arc<FakeLauncher>) {
    let launcher = Arc::new(FakeLauncher::single("alpha", site));
    let service = aggregator(launcher.clone(), today, 0);
    let result = service
        .build_calendar(&school("alpha"), weeks, &CancellationToken::new())
        .await;
    (result, launcher)
}

/// 日历的结构性约束
fn assert_calendar_invariants(result: &ScrapeResult) {
    assert!(result.calendar.week_count() <= result.weeks_requested as usize);

    let mut seen = HashSet::new();
    for (week, days) in result.calendar.weeks() {
        assert!(days.len() <= 7, "week {} has {} days", week, days.len());
        assert!(
            days.windows(2).all(|pair| pair[0].date < pair[1].date),
            "week {} is not strictly ascending",
            week
        );
        for day in days {
            assert_eq!(day.week, week);
            assert!(seen.insert((week, day.date)), "duplicate {:?}", day.date);
        }
    }
}

#[tokio::test]
async fn test_today_excludes_bulletins() {
    // Given: 今天有两道菜和一行公告
    let monday = monday_week_43();
    let page = FakePage::week(
        monday,
        vec![
            (
                0,
                vec![
                    "Fiskgratäng med dillsås",
                    "Med reservation för ändringar",
                    "Vegetarisk lasagne",
                ],
            ),
            (1, vec!["Köttbullar"]),
        ],
    );

    // When: 抓取一周
    let (result, launcher) = build(FakeSite::with_pages(vec![page]), monday, 1).await;

    // Then: 今日菜单只有两道菜，状态为 Ok
    assert_eq!(result.status, ScrapeStatus::Ok);
    let today = result.today.as_ref().unwrap();
    assert_eq!(
        today.courses,
        vec!["Fiskgratäng med dillsås", "Vegetarisk lasagne"]
    );
    assert_eq!(today.courses_count, 2);
    assert_eq!(today.weekday, "Måndag");
    assert_eq!(today.week, 43);
    assert!(result.error.is_none());
    assert_eq!(launcher.stats.closes(), 1);
    assert_calendar_invariants(&result);
}

#[tokio::test]
async fn test_fewer_published_weeks_is_partial_failure() {
    // Given: 请求三周，站点只发布了两周
    let monday = monday_week_43();

    // When: 抓取
    let (result, launcher) = build(FakeSite::consecutive(monday, 2), monday, 3).await;

    // Then: 部分失败，日历恰好两周
    assert_eq!(result.status, ScrapeStatus::PartialFailure);
    assert_eq!(result.calendar.week_count(), 2);
    assert!(result.calendar.week(43).is_some());
    assert!(result.calendar.week(44).is_some());
    assert_eq!(result.weeks_collected, 2);
    assert_eq!(result.weeks_requested, 3);
    assert!(result.error.is_some());
    assert_eq!(launcher.stats.closes(), 1);
    assert_calendar_invariants(&result);
}

#[tokio::test]
async fn test_first_week_load_failure_is_failure() {
    // Given: 第一周页面无法加载
    let monday = monday_week_43();

    // When: 抓取
    let (result, launcher) = build(FakeSite::failing(), monday, 2).await;

    // Then: 失败，日历为空，没有今日菜单，浏览器已释放
    assert_eq!(result.status, ScrapeStatus::Failure);
    assert!(result.calendar.is_empty());
    assert!(result.today.is_none());
    assert_eq!(result.weeks_collected, 0);
    assert!(result.error.is_some());
    assert_eq!(launcher.stats.launches(), 1);
    assert_eq!(launcher.stats.closes(), 1);
}

#[tokio::test]
async fn test_weekend_has_no_today_view() {
    // Given: 今天是周六，页面只有工作日
    let monday = monday_week_43();
    let saturday = monday + Duration::days(5);

    // When: 抓取并生成传感器记录
    let (result, _) = build(FakeSite::consecutive(monday, 1), saturday, 1).await;
    let record = SensorRecord::from_result(&result);

    // Then: 没有今日菜单，状态为空字符串，菜品数为 0
    assert_eq!(result.status, ScrapeStatus::Ok);
    assert!(result.today.is_none());
    assert_eq!(result.calendar.day_count(), 5);
    assert_eq!(record.state, "");
    assert_eq!(record.attributes["courses_count"], 0);
}

#[tokio::test]
async fn test_later_week_extraction_error_keeps_earlier_weeks() {
    // Given: 第二周页面有日块但没有任何日期
    let monday = monday_week_43();
    let broken = FakePage::raw("Vecka 44", "Vecka 44\nMåndag\nPasta\nTisdag\nSoppa\n");
    let site = FakeSite::with_pages(vec![FakePage::workweek(monday), broken]);

    // When: 请求两周
    let (result, launcher) = build(site, monday, 2).await;

    // Then: 保留第一周，状态为部分失败
    assert_eq!(result.status, ScrapeStatus::PartialFailure);
    assert_eq!(result.calendar.week_count(), 1);
    assert_eq!(result.weeks_collected, 1);
    assert!(result.today.is_some());
    assert_eq!(launcher.stats.closes(), 1);
}

#[tokio::test]
async fn test_unresponsive_navigation_is_partial_failure() {
    // Given: "下一周" 按钮点击后页面不变化
    let monday = monday_week_43();
    let mut site = FakeSite::consecutive(monday, 3);
    site.inert_clicks = 10;

    // When: 请求三周
    let (result, _) = build(site, monday, 3).await;

    // Then: 只有第一周，错误信息说明超时
    assert_eq!(result.status, ScrapeStatus::PartialFailure);
    assert_eq!(result.calendar.week_count(), 1);
    assert!(result.error.as_deref().unwrap().contains("did not change"));
}

#[tokio::test]
async fn test_half_rendered_week_is_not_read_twice() {
    // Given: 翻页后页面有一段时间没有周标题，仍显示第 43 周
    let monday = monday_week_43();
    let mut site = FakeSite::consecutive(monday, 2);
    site.title_gap_reads = 5;

    // When: 请求两周
    let (result, _) = build(site, monday, 2).await;

    // Then: 两周都在日历中
    assert_eq!(result.status, ScrapeStatus::Ok);
    assert_eq!(result.weeks_collected, 2);
    assert_eq!(
        result.calendar.weeks().map(|(week, _)| week).collect::<Vec<_>>(),
        vec![43u32, 44]
    );
    assert_calendar_invariants(&result);
}

#[tokio::test]
async fn test_repeated_week_content_is_partial_failure() {
    // Given: 周标题变了，但菜单内容仍是上一周
    let monday = monday_week_43();
    let mut repeated = FakePage::workweek(monday);
    repeated.title = "Vecka 44".to_string();
    let site = FakeSite::with_pages(vec![FakePage::workweek(monday), repeated]);

    // When: 请求两周
    let (result, _) = build(site, monday, 2).await;

    // Then: 不把重复内容算作新的一周
    assert_eq!(result.status, ScrapeStatus::PartialFailure);
    assert_eq!(result.weeks_collected, 1);
    assert_eq!(result.calendar.week_count(), 1);
    assert!(result.error.as_deref().unwrap().contains("2026-10-23"));
}

#[tokio::test]
async fn test_cancellation_keeps_collected_weeks() {
    // Given: 已取消的令牌
    let monday = monday_week_43();
    let launcher = Arc::new(FakeLauncher::single(
        "alpha",
        FakeSite::consecutive(monday, 3),
    ));
    let service = aggregator(launcher.clone(), monday, 0);
    let cancel = CancellationToken::new();
    cancel.cancel();

    // When: 请求三周
    let result = service.build_calendar(&school("alpha"), 3, &cancel).await;

    // Then: 在第一次翻页前停止
    assert_eq!(result.status, ScrapeStatus::PartialFailure);
    assert_eq!(result.calendar.week_count(), 1);
    assert_eq!(result.error.as_deref(), Some("run deadline exceeded"));
    assert_eq!(launcher.stats.clicks(), 0);
    assert_eq!(launcher.stats.closes(), 1);
}

#[tokio::test]
async fn test_overlapping_pages_do_not_duplicate_dates() {
    // Given: 第二页重复了第一页的周五
    let monday = monday_week_43();
    let next_monday = monday + Duration::weeks(1);
    let first = FakePage::week(monday, vec![(3, vec!["Soppa"]), (4, vec!["Gammal tacos"])]);
    let mut second = FakePage::week(next_monday, vec![(0, vec!["Pasta"])]);
    second.content = Some(format!(
        "Vecka 44\nFredag\n2026-10-23\nNy tacos\n{}",
        second.content.unwrap().trim_start_matches("Vecka 44\n")
    ));

    // When: 请求两周
    let (result, _) = build(FakeSite::with_pages(vec![first, second]), monday, 2).await;

    // Then: 周五只出现一次，以后读到的为准
    assert_eq!(result.status, ScrapeStatus::Ok);
    let week_43 = result.calendar.week(43).unwrap();
    assert_eq!(week_43.len(), 2);
    assert_eq!(week_43[1].courses, vec!["Ny tacos"]);
    assert_calendar_invariants(&result);
}

#[tokio::test]
async fn test_calendar_invariants_hold_for_every_horizon() {
    let monday = monday_week_43();
    for weeks in 1..=10u32 {
        // Given: 十周的完整数据，包含周末
        let pages = (0..10)
            .map(|i| {
                let start = monday + Duration::weeks(i);
                FakePage::week(
                    start,
                    (0..7).map(|d| (d, vec!["Dagens rätt"])).collect(),
                )
            })
            .collect();

        // When: 抓取不同的周数
        let (result, _) = build(FakeSite::with_pages(pages), monday, weeks).await;

        // Then: 结构约束始终成立
        assert_eq!(result.status, ScrapeStatus::Ok);
        assert_eq!(result.calendar.week_count(), weeks as usize);
        assert_eq!(result.calendar.day_count(), 7 * weeks as usize);
        assert_calendar_invariants(&result);
    }
}

#[tokio::test]
async fn test_calendar_spans_year_boundary() {
    // Given: 2026 年第 53 周和 2027 年第 1 周
    let monday = NaiveDate::from_ymd_opt(2026, 12, 28).unwrap();

    // When: 抓取两周
    let (result, _) = build(FakeSite::consecutive(monday, 2), monday, 2).await;

    // Then: 两个 ISO 周都在日历中
    assert_eq!(result.status, ScrapeStatus::Ok);
    assert!(result.calendar.week(53).is_some());
    assert!(result.calendar.week(1).is_some());
    assert_calendar_invariants(&result);
}
