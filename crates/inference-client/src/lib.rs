//! inference-client — HTTP clients for the analysis backend and the hosted
//! report store, plus the retry and progress-stream plumbing they share.

pub mod backend;
pub mod progress;
pub mod reports;
pub mod retry;

pub use backend::{
    AnalysisApi, BackendClient, GeneratedReport, QuestionRequest, QuestionResponse,
    QuestionStatus, ReportRequest,
};
pub use progress::{
    ProgressConnector, ProgressEvent, ProgressSource, SseProgressConnector, SseProgressSource,
};
pub use reports::ReportStore;
pub use retry::{backoff_delay, with_backoff};
