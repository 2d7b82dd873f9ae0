//! Background submission worker for the TUI.
//!
//! Requests go out over one channel, completions come back over another.
//! The UI loop polls [`SubmissionWorker::try_complete`] on every tick so
//! the list stays interactive while a submission runs.

use snaplist_core::actions::{ActionRequest, SubmissionChannel};
use snaplist_core::model::{Snapshot, SnapshotKind};
use snaplist_core::store::SnapshotStore;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

/// Outcome of one submission.
#[derive(Debug)]
pub struct Completion {
    pub request: ActionRequest,
    pub result: Result<Vec<Snapshot>, String>,
}

pub struct SubmissionWorker {
    requests: Option<Sender<ActionRequest>>,
    completions: Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
}

impl SubmissionWorker {
    pub fn spawn(store: SnapshotStore, project_id: String, kind: SnapshotKind) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<ActionRequest>();
        let (completion_tx, completion_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            for request in request_rx {
                tracing::debug!(action = request.name(), "worker executing");
                let result = store
                    .execute(&project_id, kind, &request)
                    .map_err(|err| format!("[{}] {err}", err.code()));
                if completion_tx.send(Completion { request, result }).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: Some(request_tx),
            completions: completion_rx,
            handle: Some(handle),
        }
    }

    /// A finished submission, if one is ready.
    pub fn try_complete(&self) -> Option<Completion> {
        match self.completions.try_recv() {
            Ok(completion) => Some(completion),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

impl SubmissionChannel for SubmissionWorker {
    fn submit(&mut self, request: ActionRequest) -> Result<(), String> {
        let Some(tx) = &self.requests else {
            return Err("submission worker stopped".to_string());
        };
        tx.send(request)
            .map_err(|_| "submission worker stopped".to_string())
    }
}

impl Drop for SubmissionWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
