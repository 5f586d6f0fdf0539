//! Analysis backend client.
//!
//! Endpoints: the four dashboard feeds plus the three research operations
//! (upload, question polling, report generation).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use inference_common::{
    Document, InferenceError, Metric, ProductNews, QaPair, RegulatoryUpdate, Result, Summary,
    TechEvent,
};

const BACKEND_DEFAULT_URL: &str = "http://localhost:8001";

/// HTTP client for the analysis backend.
pub struct BackendClient {
    base_url: String,
    client: Client,
}

impl BackendClient {
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.unwrap_or(BACKEND_DEFAULT_URL).trim_end_matches('/').to_string(),
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(InferenceError::Backend(format!(
                "GET {} failed with {}: {}",
                path, status, body
            )));
        }

        Ok(resp.json::<T>().await?)
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(InferenceError::Backend(format!(
                "POST {} failed with {}: {}",
                path, status, body
            )));
        }

        Ok(resp.json::<T>().await?)
    }

    /// Fetch the financial metrics feed. Older backend builds return a bare
    /// array, newer ones wrap it in `{data: [...]}`; both decode.
    #[instrument(skip(self))]
    pub async fn financial_metrics(&self) -> Result<Vec<Metric>> {
        let resp: MetricsResponse = self.get_json("/api/financial-metrics").await?;
        let metrics = resp.into_metrics();
        debug!(count = metrics.len(), "fetched financial metrics");
        Ok(metrics)
    }

    pub async fn tech_events(&self) -> Result<Vec<TechEvent>> {
        self.get_json("/api/tech-events").await
    }

    pub async fn product_news(&self) -> Result<Vec<ProductNews>> {
        self.get_json("/api/product-news").await
    }

    pub async fn regulatory_updates(&self) -> Result<Vec<RegulatoryUpdate>> {
        self.get_json("/api/regulatory").await
    }

    /// URL of the server-push progress stream paired with document uploads.
    pub fn progress_url(&self) -> String {
        format!("{}/api/research/progress", self.base_url)
    }
}

/// Both observed response shapes for `/api/financial-metrics`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MetricsResponse {
    Wrapped { data: Vec<Metric> },
    Bare(Vec<Metric>),
}

impl MetricsResponse {
    fn into_metrics(self) -> Vec<Metric> {
        match self {
            MetricsResponse::Wrapped { data } => data,
            MetricsResponse::Bare(metrics) => metrics,
        }
    }
}

// ---------------------------------------------------------------------------
// Research operations
// ---------------------------------------------------------------------------

/// Wire body for `/api/research/question`. The same body is re-sent on every
/// poll for a given question id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionRequest {
    pub question_id: String,
    pub question: String,
    pub document_content: String,
    pub context_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionResponse {
    pub status: String,
    #[serde(default)]
    pub answer: Option<String>,
}

/// Classified question-poll outcome. Any status other than `complete` or
/// `error` means the backend is still working on it.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionStatus {
    Complete(String),
    Error(String),
    Processing,
}

impl QuestionResponse {
    pub fn classify(self) -> QuestionStatus {
        match self.status.as_str() {
            "complete" => QuestionStatus::Complete(self.answer.unwrap_or_default()),
            "error" => QuestionStatus::Error(
                self.answer.unwrap_or_else(|| "analysis failed".to_string()),
            ),
            _ => QuestionStatus::Processing,
        }
    }
}

/// Wire body for `/api/research/generate-report`: the document fields plus
/// the accumulated summary and Q&A context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub title: String,
    pub document_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_date: Option<String>,
    pub summary: String,
    pub qa_insights: Vec<QaPair>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedReport {
    pub report: String,
}

/// The analysis backend's research surface, as a trait so the workflow can
/// be exercised against a scripted backend.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn upload_document(&self, doc: &Document) -> Result<Summary>;
    async fn poll_question(&self, req: &QuestionRequest) -> Result<QuestionResponse>;
    async fn generate_report(&self, req: &ReportRequest) -> Result<GeneratedReport>;
}

#[async_trait]
impl AnalysisApi for BackendClient {
    #[instrument(skip(self, doc), fields(title = %doc.title))]
    async fn upload_document(&self, doc: &Document) -> Result<Summary> {
        self.post_json("/api/research/upload", doc).await
    }

    async fn poll_question(&self, req: &QuestionRequest) -> Result<QuestionResponse> {
        self.post_json("/api/research/question", req).await
    }

    #[instrument(skip(self, req), fields(title = %req.title))]
    async fn generate_report(&self, req: &ReportRequest) -> Result<GeneratedReport> {
        self.post_json("/api/research/generate-report", req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_response_decodes_bare_array() {
        let json = r#"[{"symbol":"NVDA","name":"NVIDIA","price":875.5,"change":1.2,"marketCap":2.1e12,"volume":4.2e7}]"#;
        let resp: MetricsResponse = serde_json::from_str(json).unwrap();
        let metrics = resp.into_metrics();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].symbol, "NVDA");
    }

    #[test]
    fn test_metrics_response_decodes_wrapped_array() {
        let json = r#"{"data":[{"symbol":"MSFT","name":"Microsoft","price":420.0,"change":-0.4,"marketCap":3.1e12,"volume":1.9e7}]}"#;
        let resp: MetricsResponse = serde_json::from_str(json).unwrap();
        let metrics = resp.into_metrics();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].name, "Microsoft");
    }

    #[test]
    fn test_metric_defaults_missing_numbers() {
        let json = r#"[{"symbol":"AMD","name":"AMD"}]"#;
        let resp: MetricsResponse = serde_json::from_str(json).unwrap();
        let metrics = resp.into_metrics();
        assert_eq!(metrics[0].price, 0.0);
        assert_eq!(metrics[0].market_cap, 0.0);
    }

    #[test]
    fn test_question_response_classification() {
        let complete = QuestionResponse {
            status: "complete".to_string(),
            answer: Some("42".to_string()),
        };
        assert_eq!(complete.classify(), QuestionStatus::Complete("42".to_string()));

        let error = QuestionResponse {
            status: "error".to_string(),
            answer: Some("model overloaded".to_string()),
        };
        assert_eq!(
            error.classify(),
            QuestionStatus::Error("model overloaded".to_string())
        );

        // Anything else means the backend is still working.
        for status in ["processing", "queued", "unknown"] {
            let resp = QuestionResponse {
                status: status.to_string(),
                answer: None,
            };
            assert_eq!(resp.classify(), QuestionStatus::Processing);
        }
    }
}
