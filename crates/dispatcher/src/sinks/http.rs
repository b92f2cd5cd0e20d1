//! HttpSink - JSON POST to the collector

use std::collections::HashMap;
use std::time::Duration;

use contracts::{CollectorReply, ContractError, RecordSink, UploadPayload};
use reqwest::{Client, StatusCode, Url};
use tracing::{info, instrument};

const DEFAULT_PATH: &str = "/upload";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    /// Full endpoint; a bare host gets `/upload`
    pub url: Url,
    pub timeout: Duration,
}

impl HttpSinkConfig {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let raw = params
            .get("url")
            .ok_or_else(|| "missing 'url' parameter".to_string())?;
        let mut url = Url::parse(raw).map_err(|e| format!("invalid url '{}': {}", raw, e))?;
        if url.path() == "/" || url.path().is_empty() {
            url.set_path(DEFAULT_PATH);
        }

        let timeout_ms = match params.get("timeout_ms") {
            Some(s) => s
                .parse()
                .map_err(|e| format!("invalid timeout_ms '{}': {}", s, e))?,
            None => DEFAULT_TIMEOUT_MS,
        };

        Ok(Self {
            url,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

/// Sink that POSTs each record as one JSON document
pub struct HttpSink {
    name: String,
    config: HttpSinkConfig,
    client: Client,
}

impl HttpSink {
    pub fn new(name: impl Into<String>, config: HttpSinkConfig) -> Result<Self, ContractError> {
        let name = name.into();
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ContractError::upload(&name, e.to_string()))?;
        Ok(Self {
            name,
            config,
            client,
        })
    }

    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config =
            HttpSinkConfig::from_params(params).map_err(|e| ContractError::upload(&name, e))?;
        Self::new(name, config)
    }

    pub fn url(&self) -> &Url {
        &self.config.url
    }

    fn reply_text(body: &str) -> String {
        match serde_json::from_str::<CollectorReply>(body) {
            Ok(CollectorReply::Ack { status }) => status,
            Ok(CollectorReply::Rejected { error }) => error,
            Err(_) => body.trim().chars().take(200).collect(),
        }
    }
}

impl RecordSink for HttpSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_sink_deliver",
        skip(self, payload),
        fields(sink = %self.name, url = %self.config.url)
    )]
    async fn deliver(&self, payload: &UploadPayload) -> Result<(), ContractError> {
        let response = self
            .client
            .post(self.config.url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| ContractError::upload(&self.name, e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let reply = Self::reply_text(&body);

        if status == StatusCode::OK {
            info!(status = status.as_u16(), reply = %reply, "Upload accepted");
            Ok(())
        } else {
            Err(ContractError::upload(
                &self.name,
                format!("HTTP {}: {}", status.as_u16(), reply),
            ))
        }
    }

    async fn close(&self) -> Result<(), ContractError> {
        Ok(())
    }
}
