//! Read-only client for the hosted report store (Postgres-over-REST).
//!
//! Reports are written by the analysis backend; this side only lists them,
//! newest first.

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

use inference_common::{InferenceError, Report, Result};

pub struct ReportStore {
    base_url: String,
    anon_key: String,
    client: Client,
}

impl ReportStore {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
        })
    }

    /// List all persisted reports, newest first.
    #[instrument(skip(self))]
    pub async fn list_reports(&self) -> Result<Vec<Report>> {
        let url = format!(
            "{}/rest/v1/reports?select=*&order=created_at.desc",
            self.base_url
        );
        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(InferenceError::Backend(format!(
                "report store query failed with {}: {}",
                status, body
            )));
        }

        let reports: Vec<Report> = resp.json().await?;
        debug!(count = reports.len(), "fetched persisted reports");
        Ok(reports)
    }
}
