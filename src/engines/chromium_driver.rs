// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::engines::traits::{BrowserDriver, BrowserLauncher, ControlOutcome};
use crate::utils::errors::DriverError;
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

// Flags needed to run headless Chrome inside a container.
const CONTAINER_ARGS: &[&str] = &[
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
    "--disable-component-update",
    "--disable-sync",
    "--disable-translate",
    "--no-first-run",
    "--no-default-browser-check",
    "--no-pings",
    "--log-level=3",
    "--silent",
];

// The leaf-text fallback skips the menu itself so bulletins mentioning
// "Nästa vecka" are never clicked.
const CLICK_SCRIPT: &str = r#"
(labels, menuSelector) => {
    const wanted = labels.map((l) => l.toLowerCase());
    const matches = (el) => {
        const text = (el.innerText || el.textContent || '').trim().toLowerCase();
        return text.length > 0 && wanted.some((w) => text.includes(w));
    };
    const menu = menuSelector ? document.querySelector(menuSelector) : null;
    let el = Array.from(document.querySelectorAll('button, a, [role="button"]')).find(matches);
    if (!el) {
        el = Array.from(document.querySelectorAll('body *'))
            .find((e) => e.children.length === 0 && !(menu && menu.contains(e)) && matches(e));
    }
    if (!el) {
        return 'missing';
    }
    const target = el.closest('button, a, [role="button"]') || el;
    if (target.disabled || target.getAttribute('aria-disabled') === 'true') {
        return 'disabled';
    }
    target.click();
    return 'clicked';
}
"#;

// CDP drops `null` values, so element lookups always return an object.
#[derive(Debug, Deserialize)]
struct TextProbe {
    found: bool,
    text: String,
}

/// 基于 chromiumoxide 的浏览器启动器
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    settings: BrowserSettings,
}

impl ChromiumLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    fn browser_config(&self) -> Result<BrowserConfig, DriverError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(self.settings.window_width, self.settings.window_height)
            .request_timeout(Duration::from_secs(self.settings.page_load_timeout_secs));

        if !self.settings.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &self.settings.executable {
            builder = builder.chrome_executable(executable);
        }
        for arg in CONTAINER_ARGS {
            builder = builder.arg(*arg);
        }

        builder.build().map_err(DriverError::Launch)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>, DriverError> {
        let remote = self.settings.remote_debugging_url.is_some();
        let (browser, mut handler) = if let Some(url) = &self.settings.remote_debugging_url {
            tracing::info!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url.as_str())
                .await
                .map_err(|e| DriverError::Launch(format!("failed to connect to remote Chrome: {}", e)))?
        } else {
            Browser::launch(self.browser_config()?)
                .await
                .map_err(|e| DriverError::Launch(e.to_string()))?
        };

        // Spawn a handler to process browser events
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        let user_agent = self
            .settings
            .user_agent
            .as_deref()
            .unwrap_or(DEFAULT_USER_AGENT);
        page.set_user_agent(user_agent)
            .await
            .map_err(|e| DriverError::Other(e.to_string()))?;

        if let Ok(version) = browser.version().await {
            tracing::info!(product = %version.product, "Chrome session started");
        }

        Ok(Box::new(ChromiumDriver {
            browser: Some(browser),
            page: Some(page),
            handler_task: Some(handler_task),
            remote,
            menu_selector: None,
        }))
    }
}

/// 一个独占的 Chrome 会话
pub struct ChromiumDriver {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
    /// 远程浏览器只关闭页面，不关闭浏览器进程
    remote: bool,
    /// 最近一次加载时的菜单容器选择器
    menu_selector: Option<String>,
}

impl ChromiumDriver {
    fn page(&self) -> Result<&Page, DriverError> {
        self.page.as_ref().ok_or(DriverError::Closed)
    }

    async fn evaluate_text(&self, selector: &str) -> Result<Option<String>, DriverError> {
        let selector = serde_json::to_string(selector).map_err(|e| DriverError::Other(e.to_string()))?;
        let script = format!(
            "(() => {{ const el = document.querySelector({}); return {{ found: !!el, text: el ? el.innerText : '' }}; }})()",
            selector
        );
        let probe = self
            .page()?
            .evaluate(script)
            .await
            .map_err(|e| DriverError::Other(e.to_string()))?
            .into_value::<TextProbe>()
            .map_err(|e| DriverError::Other(e.to_string()))?;

        Ok(probe.found.then_some(probe.text))
    }

    async fn try_click(&self, labels: &[String]) -> Result<ControlOutcome, DriverError> {
        let script = click_script(labels, self.menu_selector.as_deref())?;
        let outcome = self
            .page()?
            .evaluate(script)
            .await
            .map_err(|e| DriverError::Other(e.to_string()))?
            .into_value::<String>()
            .map_err(|e| DriverError::Other(e.to_string()))?;

        Ok(match outcome.as_str() {
            "clicked" => ControlOutcome::Clicked,
            "disabled" => ControlOutcome::Disabled,
            _ => ControlOutcome::Missing,
        })
    }
}

/// 生成 "下一周" 点击脚本的调用表达式
fn click_script(labels: &[String], menu_selector: Option<&str>) -> Result<String, DriverError> {
    let labels = serde_json::to_string(labels).map_err(|e| DriverError::Other(e.to_string()))?;
    let menu_selector =
        serde_json::to_string(&menu_selector).map_err(|e| DriverError::Other(e.to_string()))?;
    Ok(format!(
        "({})({}, {})",
        CLICK_SCRIPT.trim(),
        labels,
        menu_selector
    ))
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn load(
        &mut self,
        url: &str,
        ready_selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        self.menu_selector = Some(ready_selector.to_string());
        let page = self.page()?;
        tokio::time::timeout(timeout, page.goto(url))
            .await
            .map_err(|_| DriverError::Timeout(timeout))?
            .map_err(|e| DriverError::Other(e.to_string()))?;

        let title = page.get_title().await.ok().flatten().unwrap_or_default();
        tracing::debug!(url, title = %title, "Page loaded");
        let lowered = title.to_lowercase();
        if lowered.contains("404") || lowered.contains("not found") {
            tracing::warn!("Possible 404 page detected. Title: '{}'", title);
        }

        let deadline = Instant::now() + timeout;
        loop {
            if self.evaluate_text(ready_selector).await?.is_some() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout(timeout));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn click_control(
        &mut self,
        labels: &[String],
        timeout: Duration,
    ) -> Result<ControlOutcome, DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            let outcome = self.try_click(labels).await?;
            if outcome == ControlOutcome::Clicked || Instant::now() >= deadline {
                return Ok(outcome);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn read_text(&mut self, selector: &str) -> Result<Option<String>, DriverError> {
        self.evaluate_text(selector).await
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        let mut first_error = None;

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                first_error.get_or_insert(DriverError::Other(e.to_string()));
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if !self.remote {
                if let Err(e) = browser.close().await {
                    first_error.get_or_insert(DriverError::Other(e.to_string()));
                }
                let _ = browser.wait().await;
            }
        }

        if let Some(task) = self.handler_task.take() {
            task.abort();
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        // Dropping the Browser kills a locally launched process.
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}
