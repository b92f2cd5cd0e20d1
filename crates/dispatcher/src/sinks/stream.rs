//! StreamSink - newline-delimited JSON over a byte stream

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use contracts::{ContractError, RecordSink, UploadPayload};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

const DEFAULT_WRITE_TIMEOUT_MS: u64 = 10_000;

/// One JSON document per line
///
/// Frames are written under a lock so concurrent deliveries never interleave.
/// A write that fails or exceeds `write_timeout` may leave half a frame on
/// the stream, so the sink is marked broken and refuses every later frame.
pub struct StreamSink<W> {
    name: String,
    writer: Mutex<W>,
    write_timeout: Duration,
    broken: AtomicBool,
}

impl<W: AsyncWrite + Unpin + Send> StreamSink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer: Mutex::new(writer),
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
            broken: AtomicBool::new(false),
        }
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }

    pub fn encode_frame(payload: &UploadPayload) -> Result<Vec<u8>, serde_json::Error> {
        let mut frame = serde_json::to_vec(payload)?;
        frame.push(b'\n');
        Ok(frame)
    }

    async fn write_frame(&self, frame: &[u8]) -> Result<(), String> {
        let mut writer = self.writer.lock().await;
        // a delivery that waited on the lock may find the stream already broken
        if self.is_broken() {
            return Err("stream broken by an earlier write".into());
        }
        let write = async {
            writer.write_all(frame).await?;
            writer.flush().await
        };
        match tokio::time::timeout(self.write_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "write timed out after {} ms",
                self.write_timeout.as_millis()
            )),
        }
    }
}

impl StreamSink<TcpStream> {
    #[instrument(name = "stream_sink_connect", skip(name))]
    pub async fn connect(name: impl Into<String>, addr: &str) -> std::io::Result<Self> {
        let name = name.into();
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        debug!(sink = %name, target = %addr, "StreamSink connected");
        Ok(Self::new(name, stream))
    }

    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let addr = params
            .get("addr")
            .ok_or_else(|| ContractError::upload(&name, "missing 'addr' parameter"))?;
        let write_timeout = write_timeout(params).map_err(|e| ContractError::upload(&name, e))?;
        let sink = Self::connect(name.clone(), addr)
            .await
            .map_err(|e| ContractError::upload(&name, format!("connect {}: {}", addr, e)))?;
        Ok(sink.with_write_timeout(write_timeout))
    }
}

fn write_timeout(params: &HashMap<String, String>) -> Result<Duration, String> {
    let ms = match params.get("timeout_ms") {
        Some(s) => s
            .parse()
            .map_err(|e| format!("invalid timeout_ms '{}': {}", s, e))?,
        None => DEFAULT_WRITE_TIMEOUT_MS,
    };
    Ok(Duration::from_millis(ms))
}

impl<W: AsyncWrite + Unpin + Send> RecordSink for StreamSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "stream_sink_deliver", skip(self, payload), fields(sink = %self.name))]
    async fn deliver(&self, payload: &UploadPayload) -> Result<(), ContractError> {
        let frame = Self::encode_frame(payload)
            .map_err(|e| ContractError::upload(&self.name, e.to_string()))?;

        if self.is_broken() {
            return Err(ContractError::upload(&self.name, "stream broken by an earlier write"));
        }
        self.write_frame(&frame).await.map_err(|e| {
            if !self.broken.swap(true, Ordering::AcqRel) {
                warn!(error = %e, "Stream framing lost, refusing further frames");
            }
            ContractError::upload(&self.name, e)
        })
    }

    async fn close(&self) -> Result<(), ContractError> {
        self.writer.lock().await.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::io::{AsyncBufReadExt, BufReader};

    fn payload(distance_m: f64) -> UploadPayload {
        UploadPayload {
            distance_m,
            date: "14/10/2026".into(),
            time: "10:00:00".into(),
            camera: "USB".into(),
            // large enough to need several writes
            image_b64: "A".repeat(64 * 1024),
        }
    }

    #[tokio::test]
    async fn test_concurrent_frames_do_not_interleave() {
        let (client, server) = tokio::io::duplex(4096);
        let sink = Arc::new(StreamSink::new("stream", client));

        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(server).lines();
            let mut frames = Vec::new();
            while let Some(line) = lines.next_line().await.unwrap() {
                frames.push(serde_json::from_str::<UploadPayload>(&line).unwrap());
            }
            frames
        });

        let writers: Vec<_> = (0..4)
            .map(|i| {
                let sink = Arc::clone(&sink);
                tokio::spawn(async move { sink.deliver(&payload(i as f64 * 0.1)).await })
            })
            .collect();
        for w in writers {
            w.await.unwrap().unwrap();
        }
        sink.close().await.unwrap();
        drop(sink);

        let frames = reader.await.unwrap();
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| f.image_b64.len() == 64 * 1024));
    }

    #[tokio::test]
    async fn test_frame_is_single_line() {
        let frame = StreamSink::<tokio::io::DuplexStream>::encode_frame(&payload(0.3)).unwrap();
        assert_eq!(frame.iter().filter(|b| **b == b'\n').count(), 1);
        assert_eq!(frame.last(), Some(&b'\n'));
    }

    #[tokio::test]
    async fn test_missing_addr() {
        let result = StreamSink::from_params("stream", &HashMap::new()).await;
        assert!(matches!(result, Err(ContractError::UploadFailure { .. })));
    }

    #[tokio::test]
    async fn test_stalled_peer_breaks_stream() {
        // peer holds the read half open and never reads
        let (client, _server) = tokio::io::duplex(64);
        let sink = StreamSink::new("stream", client).with_write_timeout(Duration::from_millis(50));

        let err = sink.deliver(&payload(0.2)).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(sink.is_broken());

        let started = std::time::Instant::now();
        let err = sink.deliver(&payload(0.3)).await.unwrap_err();
        assert!(err.to_string().contains("broken"));
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_write_error_breaks_stream() {
        let (client, server) = tokio::io::duplex(64);
        drop(server);
        let sink = StreamSink::new("stream", client);
        assert!(sink.deliver(&payload(0.2)).await.is_err());
        assert!(sink.is_broken());
    }

    #[test]
    fn test_timeout_param() {
        let mut params = HashMap::new();
        assert_eq!(write_timeout(&params).unwrap(), Duration::from_secs(10));
        params.insert("timeout_ms".to_string(), "250".to_string());
        assert_eq!(write_timeout(&params).unwrap(), Duration::from_millis(250));
        params.insert("timeout_ms".to_string(), "soon".to_string());
        assert!(write_timeout(&params).is_err());
    }
}
