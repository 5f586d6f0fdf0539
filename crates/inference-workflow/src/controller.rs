//! Workflow controller: phase machine, document submission, question
//! polling, and report generation.
//!
//! Phases only advance once their prerequisite data exists, and the guards
//! are re-checked on every navigation attempt. Writes from superseded async
//! work (a cancelled submit, an abandoned question) are suppressed by a
//! generation counter captured when the operation starts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use inference_client::{
    AnalysisApi, ProgressConnector, QuestionRequest, QuestionStatus, ReportRequest,
};
use inference_common::{
    Document, InferenceError, PendingQuestion, QaPair, Result, Summary, WorkflowPhase,
};
use inference_config::{Config, ReportCompletion};
use uuid::Uuid;

use crate::channel::ProgressChannel;
use crate::pending::PendingStore;
use crate::state::{WorkflowEvent, WorkflowState};

#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub poll_interval: Duration,
    pub pending_ttl: chrono::Duration,
    pub qa_timeout: Duration,
    pub report_completion: ReportCompletion,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            pending_ttl: chrono::Duration::minutes(5),
            qa_timeout: Duration::from_secs(120),
            report_completion: ReportCompletion::Inline,
        }
    }
}

impl From<&Config> for WorkflowSettings {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.qa.poll_interval_ms),
            pending_ttl: chrono::Duration::seconds(config.qa.pending_ttl_secs as i64),
            qa_timeout: Duration::from_secs(config.qa.timeout_secs),
            report_completion: config.report.completion,
        }
    }
}

/// What the caller should do after a successful report.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    /// Display the returned report text directly
    Inline(String),
    /// Switch to the persisted-reports listing
    ShowListing,
}

pub struct WorkflowController {
    state: WorkflowState,
    api: Arc<dyn AnalysisApi>,
    connector: Arc<dyn ProgressConnector>,
    pending: Arc<dyn PendingStore>,
    settings: WorkflowSettings,
    generation: Arc<AtomicU64>,
    progress: Mutex<Option<ProgressChannel>>,
    qa_task: Mutex<Option<JoinHandle<()>>>,
}

impl WorkflowController {
    pub fn new(
        state: WorkflowState,
        api: Arc<dyn AnalysisApi>,
        connector: Arc<dyn ProgressConnector>,
        pending: Arc<dyn PendingStore>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            state,
            api,
            connector,
            pending,
            settings,
            generation: Arc::new(AtomicU64::new(0)),
            progress: Mutex::new(None),
            qa_task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn close_progress(&self) {
        if let Some(mut channel) = self
            .progress
            .lock()
            .expect("progress slot poisoned")
            .take()
        {
            channel.close();
        }
    }

    fn abort_qa_task(&self) {
        if let Some(handle) = self.qa_task.lock().expect("qa task slot poisoned").take() {
            handle.abort();
        }
    }

    /// Navigate to a phase. Forward navigation happens through the
    /// operations; this is the user clicking a step tab, and it is only
    /// allowed when the target phase's prerequisite data exists.
    pub fn navigate(&self, phase: WorkflowPhase) -> Result<()> {
        let allowed = match phase {
            WorkflowPhase::Upload => true,
            WorkflowPhase::Summary => self.state.document().is_some(),
            WorkflowPhase::Qa => self.state.summary().is_some(),
            WorkflowPhase::Report => !self.state.qa_history().is_empty(),
        };
        if !allowed {
            return Err(InferenceError::Validation(format!(
                "cannot navigate to {phase}: prerequisite data missing"
            )));
        }
        self.state.set_phase(phase);
        Ok(())
    }

    /// Submit a document for analysis. Opens the progress channel alongside
    /// the upload request; on success the summary is stored and the phase
    /// advances to Summary, but only if the user is still on Upload and no
    /// newer operation superseded this one.
    #[instrument(skip(self, doc), fields(title = %doc.title))]
    pub async fn submit_document(&self, doc: Document) -> Result<Summary> {
        if doc.title.trim().is_empty() || doc.content.trim().is_empty() {
            return Err(InferenceError::Validation(
                "document title and content are required".to_string(),
            ));
        }

        let generation = self.bump_generation();
        self.close_progress(); // last writer wins, never two channels
        self.state.set_progress(0);
        self.state.set_status("Starting analysis...");
        self.state.set_document(Some(doc.clone()));

        match self.connector.connect().await {
            Ok(source) => {
                *self.progress.lock().expect("progress slot poisoned") =
                    Some(ProgressChannel::open(self.state.clone(), source));
            }
            Err(err) => {
                warn!(error = %err, "progress stream unavailable, continuing without it");
            }
        }

        match self.api.upload_document(&doc).await {
            Ok(summary) => {
                if self.generation.load(Ordering::SeqCst) == generation {
                    self.state.set_summary(Some(summary.clone()));
                    if self.state.phase() == WorkflowPhase::Upload {
                        self.state.set_phase(WorkflowPhase::Summary);
                    }
                }
                info!(key_points = summary.key_points.len(), "document analyzed");
                Ok(summary)
            }
            Err(err) => {
                self.close_progress();
                if self.generation.load(Ordering::SeqCst) == generation {
                    self.state.set_status("Error: Failed to analyze document");
                    self.state.set_progress(0);
                }
                Err(err)
            }
        }
    }

    /// Ask a question about the current document. The marker is persisted
    /// before any network call so an interrupted session can resume; any
    /// previous in-flight question is cancelled first.
    pub fn ask(&self, question: &str) -> Result<Uuid> {
        let question = question.trim();
        if question.is_empty() {
            return Err(InferenceError::Validation("question is required".to_string()));
        }
        let document = self.state.document().ok_or_else(|| {
            InferenceError::Validation("no document to ask about".to_string())
        })?;

        let generation = self.bump_generation();
        let pending = PendingQuestion::new(question);
        self.pending.save(&pending)?;
        let id = pending.id;
        self.spawn_poll(pending, document.content, generation);
        Ok(id)
    }

    /// Resume an interrupted question on startup. Markers older than the
    /// staleness window are discarded without issuing a poll.
    pub fn resume_pending(&self) -> Result<Option<Uuid>> {
        match self.pending.load()? {
            Some(pending) if !pending.is_expired(self.settings.pending_ttl) => {
                info!(question_id = %pending.id, "resuming pending question");
                let generation = self.bump_generation();
                let content = self
                    .state
                    .document()
                    .map(|doc| doc.content)
                    .unwrap_or_default();
                let id = pending.id;
                self.spawn_poll(pending, content, generation);
                Ok(Some(id))
            }
            Some(pending) => {
                info!(question_id = %pending.id, "discarding stale pending question");
                self.pending.clear()?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn spawn_poll(&self, pending: PendingQuestion, document_content: String, generation: u64) {
        let api = self.api.clone();
        let state = self.state.clone();
        let store = self.pending.clone();
        let counter = self.generation.clone();
        let poll_interval = self.settings.poll_interval;
        let deadline = tokio::time::Instant::now() + self.settings.qa_timeout;

        let request = QuestionRequest {
            question_id: pending.id.to_string(),
            question: pending.question.clone(),
            document_content,
            context_id: "current".to_string(),
        };

        // A fresh question replaces whatever status the last one left behind,
        // including a lingering error.
        self.state.set_status("Thinking...");

        let handle = tokio::spawn(async move {
            loop {
                if counter.load(Ordering::SeqCst) != generation {
                    return; // superseded by a newer question or reset
                }
                match api.poll_question(&request).await {
                    Ok(resp) => match resp.classify() {
                        QuestionStatus::Complete(answer) => {
                            if counter.load(Ordering::SeqCst) == generation {
                                state.push_qa(QaPair {
                                    question: pending.question.clone(),
                                    answer,
                                });
                                if let Err(err) = store.clear() {
                                    warn!(error = %err, "failed to clear pending marker");
                                }
                                state.emit(WorkflowEvent::AnswerReady {
                                    question: pending.question.clone(),
                                });
                            }
                            return;
                        }
                        QuestionStatus::Error(message) => {
                            if counter.load(Ordering::SeqCst) == generation {
                                state.set_status(format!("Error: {message}"));
                                let _ = store.clear();
                            }
                            return;
                        }
                        QuestionStatus::Processing => {}
                    },
                    Err(err) => {
                        // Transport failure is terminal for this question; the
                        // marker stays so a restart can pick it back up.
                        if counter.load(Ordering::SeqCst) == generation {
                            warn!(error = %err, "question poll failed");
                            state.set_status(format!("Error: {err}"));
                        }
                        return;
                    }
                }

                if tokio::time::Instant::now() >= deadline {
                    if counter.load(Ordering::SeqCst) == generation {
                        state.set_status("Error: question timed out".to_string());
                        let _ = store.clear();
                    }
                    return;
                }
                tokio::time::sleep(poll_interval).await;
            }
        });

        let mut slot = self.qa_task.lock().expect("qa task slot poisoned");
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    /// Generate the final report from the accumulated context. A missing
    /// document or summary makes this a no-op, not an error; the UI simply
    /// has nothing to generate from yet.
    pub async fn generate_report(&self) -> Result<Option<ReportOutcome>> {
        let (doc, summary) = match (self.state.document(), self.state.summary()) {
            (Some(doc), Some(summary)) => (doc, summary),
            _ => return Ok(None),
        };

        let request = ReportRequest {
            title: doc.title,
            document_content: doc.content,
            document_url: doc.url,
            document_date: doc.date,
            summary: summary.summary,
            qa_insights: self.state.qa_history(),
        };

        let generated = self.api.generate_report(&request).await?;
        self.state.emit(WorkflowEvent::ReportReady);

        Ok(Some(match self.settings.report_completion {
            ReportCompletion::Inline => ReportOutcome::Inline(generated.report),
            ReportCompletion::Listing => ReportOutcome::ShowListing,
        }))
    }

    /// Tear everything down and return to the initial upload phase.
    pub fn reset(&self) -> Result<()> {
        self.bump_generation();
        self.close_progress();
        self.abort_qa_task();
        self.state.reset();
        self.pending.clear()
    }
}

impl Drop for WorkflowController {
    fn drop(&mut self) {
        // The progress channel must never outlive its workflow.
        self.close_progress();
        self.abort_qa_task();
    }
}
