/// Research workflow domain types.
/// These mirror the wire shapes exchanged with the analysis backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InferenceError, Result};

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Transcript,
    Article,
}

/// A document submitted for analysis. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Document {
    /// Build a document from raw user input, trimming whitespace.
    /// Rejects empty title or content so no request is issued for them.
    pub fn new(
        title: &str,
        content: &str,
        doc_type: DocumentType,
        url: Option<&str>,
        date: Option<&str>,
    ) -> Result<Self> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(InferenceError::Validation(
                "document title and content are required".to_string(),
            ));
        }
        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            doc_type,
            url: url.map(str::trim).filter(|u| !u.is_empty()).map(String::from),
            date: date.map(str::trim).filter(|d| !d.is_empty()).map(String::from),
        })
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
}

/// Produced exactly once per document by the analysis backend; read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Q&A
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Durable marker for an in-flight question, persisted so a restarted
/// session can resume polling for the same question id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingQuestion {
    pub id: Uuid,
    pub question: String,
    pub timestamp: DateTime<Utc>,
}

impl PendingQuestion {
    pub fn new(question: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// A marker older than the TTL must be discarded, not resumed.
    pub fn is_expired(&self, ttl: chrono::Duration) -> bool {
        Utc::now() - self.timestamp > ttl
    }
}

// ---------------------------------------------------------------------------
// Workflow phase
// ---------------------------------------------------------------------------

/// The four sequential states of the research workflow.
/// Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowPhase {
    Upload,
    Summary,
    Qa,
    Report,
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowPhase::Upload => "upload",
            WorkflowPhase::Summary => "summary",
            WorkflowPhase::Qa => "qa",
            WorkflowPhase::Report => "report",
        };
        f.write_str(s)
    }
}
