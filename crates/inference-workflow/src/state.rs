//! Shared research state, injected into the controller and its tasks.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

use inference_common::{Document, QaPair, Summary, WorkflowPhase};

/// The full workflow snapshot: current phase plus everything accumulated
/// during the session.
#[derive(Debug, Clone)]
pub struct ResearchState {
    pub phase: WorkflowPhase,
    pub document: Option<Document>,
    pub summary: Option<Summary>,
    pub qa_history: Vec<QaPair>,
    pub status: String,
    pub progress: u8,
}

impl ResearchState {
    fn initial() -> Self {
        Self {
            phase: WorkflowPhase::Upload,
            document: None,
            summary: None,
            qa_history: Vec::new(),
            status: String::new(),
            progress: 0,
        }
    }
}

/// Completion notifications raised toward the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    /// Analysis progress reached 100
    AnalysisComplete,
    /// A question resolved and was appended to the history
    AnswerReady { question: String },
    /// A report was generated
    ReportReady,
}

/// Cloneable handle to the shared state. Mutations are synchronous and
/// last-write-wins; stale async writers are suppressed by the controller's
/// generation check, not here.
#[derive(Clone)]
pub struct WorkflowState {
    inner: Arc<Mutex<ResearchState>>,
    event_tx: broadcast::Sender<WorkflowEvent>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Mutex::new(ResearchState::initial())),
            event_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ResearchState> {
        self.inner.lock().expect("research state lock poisoned")
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.event_tx.subscribe()
    }

    pub fn emit(&self, event: WorkflowEvent) {
        // No receivers is fine; events are advisory.
        let _ = self.event_tx.send(event);
    }

    pub fn snapshot(&self) -> ResearchState {
        self.lock().clone()
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.lock().phase
    }

    pub fn set_phase(&self, phase: WorkflowPhase) {
        self.lock().phase = phase;
    }

    pub fn document(&self) -> Option<Document> {
        self.lock().document.clone()
    }

    pub fn set_document(&self, document: Option<Document>) {
        self.lock().document = document;
    }

    pub fn summary(&self) -> Option<Summary> {
        self.lock().summary.clone()
    }

    pub fn set_summary(&self, summary: Option<Summary>) {
        self.lock().summary = summary;
    }

    pub fn qa_history(&self) -> Vec<QaPair> {
        self.lock().qa_history.clone()
    }

    /// Append-only; the history is never reordered or deduplicated.
    pub fn push_qa(&self, pair: QaPair) {
        self.lock().qa_history.push(pair);
    }

    pub fn status(&self) -> String {
        self.lock().status.clone()
    }

    pub fn set_status(&self, status: impl Into<String>) {
        self.lock().status = status.into();
    }

    pub fn progress(&self) -> u8 {
        self.lock().progress
    }

    pub fn set_progress(&self, progress: u8) {
        self.lock().progress = progress;
    }

    pub fn set_progress_status(&self, progress: u8, status: &str) {
        let mut state = self.lock();
        state.progress = progress;
        state.status = status.to_string();
    }

    /// Restore all fields to their initial values.
    pub fn reset(&self) {
        *self.lock() = ResearchState::initial();
    }
}
