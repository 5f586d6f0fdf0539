//! Progress channel: a cancellable subscription driving the shared
//! progress/status fields from a `ProgressSource`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use inference_client::ProgressSource;

use crate::state::{WorkflowEvent, WorkflowState};

/// At most one of these is open per workflow. Dropping it closes it; leaking
/// the underlying subscription is a defect.
pub struct ProgressChannel {
    closed: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressChannel {
    /// Spawn the reader task. Each event updates shared progress/status;
    /// `progress == 100` closes the channel and raises one completion
    /// notification. Phase changes are the controller's business, never ours.
    pub fn open(state: WorkflowState, mut source: Box<dyn ProgressSource>) -> Self {
        let closed = Arc::new(AtomicBool::new(false));
        let flag = closed.clone();

        let handle = tokio::spawn(async move {
            loop {
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                match source.next_event().await {
                    Ok(Some(event)) => {
                        if flag.load(Ordering::SeqCst) {
                            break;
                        }
                        state.set_progress_status(event.progress, &event.status);
                        if event.is_complete() {
                            if !flag.swap(true, Ordering::SeqCst) {
                                state.emit(WorkflowEvent::AnalysisComplete);
                            }
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("progress stream ended before completion");
                        flag.store(true, Ordering::SeqCst);
                        break;
                    }
                    Err(err) => {
                        // An error on an already-closed channel is a no-op.
                        if !flag.swap(true, Ordering::SeqCst) {
                            warn!(error = %err, "unexpected progress stream error");
                        }
                        break;
                    }
                }
            }
        });

        Self {
            closed,
            handle: Some(handle),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Synchronous close; safe to call repeatedly.
    pub fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ProgressChannel {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use inference_client::ProgressEvent;
    use inference_common::Result;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    struct ScriptedSource {
        events: VecDeque<ProgressEvent>,
        polls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProgressSource for ScriptedSource {
        async fn next_event(&mut self) -> Result<Option<ProgressEvent>> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(self.events.pop_front())
        }
    }

    fn event(progress: u8) -> ProgressEvent {
        ProgressEvent {
            progress,
            status: format!("at {progress}"),
        }
    }

    async fn wait_closed(channel: &ProgressChannel) {
        for _ in 0..1000 {
            if channel.is_closed() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("progress channel never closed");
    }

    #[tokio::test]
    async fn test_completion_closes_once_and_notifies_once() {
        let state = WorkflowState::new();
        let mut rx = state.subscribe();
        let polls = Arc::new(AtomicUsize::new(0));

        let source = ScriptedSource {
            // The event after 100 must never be read.
            events: VecDeque::from([event(10), event(55), event(100), event(90)]),
            polls: polls.clone(),
        };
        let channel = ProgressChannel::open(state.clone(), Box::new(source));
        wait_closed(&channel).await;

        assert_eq!(state.progress(), 100);
        assert_eq!(polls.load(Ordering::SeqCst), 3);

        let mut completions = 0;
        while let Ok(event) = rx.try_recv() {
            if event == WorkflowEvent::AnalysisComplete {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
    }

    #[tokio::test]
    async fn test_stream_end_without_completion_is_silent() {
        let state = WorkflowState::new();
        let mut rx = state.subscribe();
        let polls = Arc::new(AtomicUsize::new(0));

        let source = ScriptedSource {
            events: VecDeque::from([event(30)]),
            polls: polls.clone(),
        };
        let channel = ProgressChannel::open(state.clone(), Box::new(source));
        wait_closed(&channel).await;

        assert_eq!(state.progress(), 30);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_is_synchronous_and_repeatable() {
        let state = WorkflowState::new();
        let source = ScriptedSource {
            events: VecDeque::from([event(10)]),
            polls: Arc::new(AtomicUsize::new(0)),
        };
        let mut channel = ProgressChannel::open(state, Box::new(source));
        channel.close();
        assert!(channel.is_closed());
        channel.close();
        assert!(channel.is_closed());
    }
}
