//! Configuration loading for Inference.
//! Reads inference.toml from the current directory or path in INFERENCE_CONFIG env var.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub qa: QaConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url()     -> String { "http://localhost:8001".to_string() }
fn default_timeout_secs() -> u64    { 120 }

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Hosted report store (Postgres-over-REST). The anon key may also come
/// from the INFERENCE_STORE_KEY env var so it stays out of the toml file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

impl StoreConfig {
    pub fn resolved_key(&self) -> Option<String> {
        match &self.anon_key {
            Some(key) if !key.is_empty() => Some(key.clone()),
            _ => std::env::var("INFERENCE_STORE_KEY").ok().filter(|k| !k.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_retries()   -> u32 { 3 }
fn default_base_delay_ms() -> u64 { 1000 }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_pending_ttl_secs")]
    pub pending_ttl_secs: u64,
    #[serde(default = "default_qa_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_pending_path")]
    pub pending_path: String,
}

fn default_poll_interval_ms()  -> u64    { 1000 }
fn default_pending_ttl_secs()  -> u64    { 300 }
fn default_qa_timeout_secs()   -> u64    { 120 }
fn default_pending_path()      -> String { ".inference/pending_question.json".to_string() }

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            pending_ttl_secs: default_pending_ttl_secs(),
            timeout_secs: default_qa_timeout_secs(),
            pending_path: default_pending_path(),
        }
    }
}

/// What happens after a report is generated: show the text inline, or
/// send the caller to the persisted-reports listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportCompletion {
    #[default]
    Inline,
    Listing,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReportConfig {
    #[serde(default)]
    pub completion: ReportCompletion,
}


impl Config {
    /// Load configuration from inference.toml.
    /// Checks INFERENCE_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("INFERENCE_CONFIG")
            .unwrap_or_else(|_| "inference.toml".to_string());

        if !Path::new(&path).exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy inference.example.toml to inference.toml and edit it.",
                path
            );
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
