// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::HomeAssistantSettings;
use crate::domain::services::sensor_publisher::{SensorPublisher, SensorRecord};
use crate::utils::errors::PublishError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

/// Home Assistant 传感器发布实现
///
/// 通过 Core REST API `POST /api/states/{entity_id}` 创建或更新传感器
pub struct HomeAssistantPublisher {
    /// HTTP 客户端
    client: reqwest::Client,
    /// Core API 根地址
    base_url: Url,
    /// 访问令牌
    token: Option<String>,
}

impl HomeAssistantPublisher {
    /// 创建新的发布器
    pub fn new(settings: &HomeAssistantSettings) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        let base = settings.url.trim_end_matches('/');
        let base_url = Url::parse(&format!("{}/", base))?;

        if settings.token.is_none() {
            debug!("No Home Assistant token configured, publishing unauthenticated");
        }

        Ok(Self {
            client,
            base_url,
            token: settings.token.clone(),
        })
    }

    fn state_url(&self, entity_id: &str) -> Result<Url, PublishError> {
        Ok(self.base_url.join(&format!("api/states/{}", entity_id))?)
    }
}

#[async_trait]
impl SensorPublisher for HomeAssistantPublisher {
    async fn publish(&self, record: &SensorRecord) -> Result<(), PublishError> {
        let url = self.state_url(&record.entity_id)?;
        debug!("Publishing {} to {}", record.entity_id, url);

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(record);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            info!(entity_id = %record.entity_id, "Sensor updated");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 => error!("Authentication failed - check the Home Assistant token"),
            403 => error!("Access forbidden - check the add-on's Home Assistant API permissions"),
            404 => error!("Home Assistant API endpoint not found"),
            _ => {}
        }
        Err(PublishError::Rejected {
            entity_id: record.entity_id.clone(),
            status: status.as_u16(),
            body,
        })
    }

    fn name(&self) -> &'static str {
        "home_assistant"
    }
}
