//! inference-common — Shared types and errors used across all Inference crates.

pub mod error;
pub mod research;
pub mod dashboard;

// Re-export commonly used types
pub use error::{InferenceError, Result};
pub use research::{
    Document, DocumentType, Entity, PendingQuestion, QaPair, Summary, WorkflowPhase,
};
pub use dashboard::{Metric, ProductNews, RegulatoryUpdate, Report, TechEvent};
