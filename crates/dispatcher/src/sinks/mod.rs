//! Transports
//!
//! `LogSink`, `HttpSink` and `StreamSink`, plus the configured-sink factory.

mod http;
mod log;
mod stream;

use contracts::{ContractError, RecordSink, SinkType, UploadConfig, UploadPayload};
use tokio::net::TcpStream;
use tracing::instrument;

use crate::error::DispatcherError;

pub use self::http::{HttpSink, HttpSinkConfig};
pub use self::log::LogSink;
pub use self::stream::StreamSink;

/// Transport selected by `upload.sink_type`
pub enum ConfiguredSink {
    Log(LogSink),
    Http(HttpSink),
    Stream(StreamSink<TcpStream>),
}

impl RecordSink for ConfiguredSink {
    fn name(&self) -> &str {
        match self {
            Self::Log(s) => s.name(),
            Self::Http(s) => s.name(),
            Self::Stream(s) => s.name(),
        }
    }

    async fn deliver(&self, payload: &UploadPayload) -> Result<(), ContractError> {
        match self {
            Self::Log(s) => s.deliver(payload).await,
            Self::Http(s) => s.deliver(payload).await,
            Self::Stream(s) => s.deliver(payload).await,
        }
    }

    async fn close(&self) -> Result<(), ContractError> {
        match self {
            Self::Log(s) => s.close().await,
            Self::Http(s) => s.close().await,
            Self::Stream(s) => s.close().await,
        }
    }
}

/// Build the transport described by `config`
#[instrument(
    name = "dispatcher_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub async fn create_sink(config: &UploadConfig) -> Result<ConfiguredSink, DispatcherError> {
    match config.sink_type {
        SinkType::Log => Ok(ConfiguredSink::Log(LogSink::new(&config.name))),
        SinkType::Http => HttpSink::from_params(&config.name, &config.params)
            .map(ConfiguredSink::Http)
            .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string())),
        SinkType::Stream => StreamSink::from_params(&config.name, &config.params)
            .await
            .map(ConfiguredSink::Stream)
            .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_log_sink() {
        let sink = create_sink(&UploadConfig::default()).await.unwrap();
        assert!(matches!(sink, ConfiguredSink::Log(_)));
        assert_eq!(sink.name(), "collector");
    }

    #[tokio::test]
    async fn test_http_sink_requires_url() {
        let config = UploadConfig {
            sink_type: SinkType::Http,
            ..UploadConfig::default()
        };
        assert!(matches!(
            create_sink(&config).await,
            Err(DispatcherError::SinkCreation { .. })
        ));
    }
}
