//! inference-workflow — The research workflow controller.
//!
//! Coordinates the four sequential phases (upload, summary, qa, report)
//! against the analysis backend, with a concurrent progress channel and a
//! durable marker for in-flight questions.

pub mod channel;
pub mod controller;
pub mod pending;
pub mod state;

pub use channel::ProgressChannel;
pub use controller::{ReportOutcome, WorkflowController, WorkflowSettings};
pub use pending::{FilePendingStore, MemoryPendingStore, PendingStore};
pub use state::{ResearchState, WorkflowEvent, WorkflowState};
