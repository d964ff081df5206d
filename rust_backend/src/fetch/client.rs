use async_trait::async_trait;
use chrono::NaiveDate;
use log::info;
use serde_json::Value;
use std::time::Duration;

use crate::config::FetchSettings;
use crate::error::{PipelineError, PipelineResult};
use crate::fetch::chunks::FeedSource;
use crate::parsing::neo_feed::NeoFeed;
use crate::time::format_day;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the NeoWs feed endpoint
#[derive(Debug, Clone)]
pub struct NeoWsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NeoWsClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> PipelineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PipelineError::Fetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_settings(settings: &FetchSettings) -> PipelineResult<Self> {
        Self::new(settings.base_url.clone(), settings.api_key.clone())
    }
}

#[async_trait]
impl FeedSource for NeoWsClient {
    async fn fetch_range(&self, start: NaiveDate, end: NaiveDate) -> PipelineResult<NeoFeed> {
        let (start_date, end_date) = (format_day(start), format_day(end));
        info!("Requesting feed {} to {}", start_date, end_date);

        let params = [
            ("start_date", start_date.as_str()),
            ("end_date", end_date.as_str()),
            ("api_key", self.api_key.as_str()),
        ];

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| PipelineError::Fetch(format!("Feed request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<empty response>".to_string());

        if !status.is_success() {
            return Err(PipelineError::Fetch(format!(
                "Feed request for {} to {} failed ({}): {}",
                start_date,
                end_date,
                status,
                body.trim()
            )));
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            PipelineError::MalformedInput(format!("Failed to parse feed response: {}", e))
        })?;
        Ok(NeoFeed::from_value(&value))
    }
}
