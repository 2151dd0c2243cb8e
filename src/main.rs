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

use clap::Parser;
use skolmaten::config::settings::Settings;
use skolmaten::domain::services::calendar_service::CalendarAggregator;
use skolmaten::domain::services::sensor_publisher::SensorPublisher;
use skolmaten::engines::chromium_driver::ChromiumLauncher;
use skolmaten::infrastructure::home_assistant::HomeAssistantPublisher;
use skolmaten::infrastructure::observability::metrics;
use skolmaten::utils::clock::{Clock, SystemClock};
use skolmaten::utils::telemetry;
use skolmaten::workers::orchestrator::SchoolOrchestrator;
use skolmaten::workers::update_worker::UpdateWorker;
use skolmaten::workers::Worker;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(version, about = "Publishes skolmaten.se lunch menus as Home Assistant sensors")]
struct Args {
    /// 只运行一次，把结果以 JSON 打印到标准输出，不发布传感器
    #[arg(long)]
    once: bool,
}

/// 主函数
///
/// 加载配置、初始化日志和指标，然后启动定时更新工作器
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging
    telemetry::init_telemetry(&settings.logging);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting skolmaten...");
    info!(
        schools = settings.schools.len(),
        weeks = settings.weeks,
        interval_secs = settings.update_interval,
        "Configuration loaded"
    );

    // 3. Initialize metrics
    metrics::init_metrics(&settings.metrics)?;

    // 4. Build the scraping pipeline
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let launcher = Arc::new(ChromiumLauncher::new(settings.browser.clone()));
    let aggregator = Arc::new(CalendarAggregator::new(
        launcher,
        settings.navigator_settings(),
        settings.day_extractor(),
        clock.clone(),
    ));
    let orchestrator = Arc::new(
        SchoolOrchestrator::new(aggregator, clock)
            .with_school_delay(Duration::from_millis(settings.school_delay_ms))
            .with_run_deadline(settings.run_deadline()),
    );

    let publisher: Option<Arc<dyn SensorPublisher>> =
        if settings.home_assistant.enabled && !args.once {
            Some(Arc::new(HomeAssistantPublisher::new(&settings.home_assistant)?))
        } else {
            None
        };

    let worker = UpdateWorker::new(
        orchestrator,
        publisher,
        settings.schools.clone(),
        settings.weeks,
        settings.update_interval(),
    );

    if args.once {
        let results = worker.run_once().await?;
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    // 5. Run until Ctrl+C
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
        }
        signal_token.cancel();
    });

    info!("Starting {}", worker.name());
    worker.run(shutdown).await?;
    info!("skolmaten stopped");
    Ok(())
}
