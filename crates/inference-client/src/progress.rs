//! Analysis progress stream.
//!
//! The backend pushes `{progress, status}` JSON over server-sent events.
//! The transport sits behind the `ProgressSource` trait so environments
//! without push support (and tests) can substitute a polling source.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use inference_common::{InferenceError, Result};

/// One progress update from the analysis backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressEvent {
    pub progress: u8,
    #[serde(default)]
    pub status: String,
}

impl ProgressEvent {
    pub fn is_complete(&self) -> bool {
        self.progress >= 100
    }
}

/// One-directional stream of progress events. `Ok(None)` means the server
/// ended the stream.
#[async_trait]
pub trait ProgressSource: Send {
    async fn next_event(&mut self) -> Result<Option<ProgressEvent>>;
}

/// Opens a fresh progress subscription for each analysis run.
#[async_trait]
pub trait ProgressConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn ProgressSource>>;
}

/// Connector producing SSE sources against the backend's progress endpoint.
pub struct SseProgressConnector {
    client: Client,
    url: String,
}

impl SseProgressConnector {
    /// The client carries no request timeout; the stream is long-lived.
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl ProgressConnector for SseProgressConnector {
    async fn connect(&self) -> Result<Box<dyn ProgressSource>> {
        Ok(Box::new(SseProgressSource::connect(&self.client, &self.url).await?))
    }
}

/// SSE-backed progress source reading `data:` frames off a streaming GET.
pub struct SseProgressSource {
    stream: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    buffer: String,
}

impl SseProgressSource {
    /// Open the stream. Fails fast on a non-2xx response.
    pub async fn connect(client: &Client, url: &str) -> Result<Self> {
        let resp = client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(InferenceError::Backend(format!(
                "progress stream rejected with {}",
                resp.status()
            )));
        }
        Ok(Self {
            stream: resp.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec())).boxed(),
            buffer: String::new(),
        })
    }
}

#[async_trait]
impl ProgressSource for SseProgressSource {
    async fn next_event(&mut self) -> Result<Option<ProgressEvent>> {
        loop {
            // Drain any complete frame already buffered before reading more.
            while let Some(frame) = take_frame(&mut self.buffer) {
                if let Some(data) = frame_data(&frame) {
                    let event: ProgressEvent = serde_json::from_str(&data)?;
                    return Ok(Some(event));
                }
            }

            match self.stream.next().await {
                Some(chunk) => self.buffer.push_str(&String::from_utf8_lossy(&chunk?)),
                None => return Ok(None),
            }
        }
    }
}

/// Pop the first complete SSE frame (terminated by a blank line) off the buffer.
fn take_frame(buffer: &mut String) -> Option<String> {
    let end = buffer.find("\n\n")?;
    let frame = buffer[..end].to_string();
    buffer.drain(..end + 2);
    Some(frame)
}

/// Join the `data:` lines of a frame; comment and keep-alive lines are skipped.
fn frame_data(frame: &str) -> Option<String> {
    let lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
