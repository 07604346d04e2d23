//! Observable lifecycle of an asynchronous workflow.

use dmerge_types::WorkflowState;
use tokio::sync::watch;

/// One workflow's state, published on a watch channel so the presentation
/// layer can follow transitions without polling.
#[derive(Debug)]
pub struct Workflow {
    tx: watch::Sender<WorkflowState>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(WorkflowState::Idle);
        Self { tx }
    }

    pub fn begin(&self) {
        self.tx.send_replace(WorkflowState::InFlight);
    }

    pub fn succeed(&self) {
        self.tx.send_replace(WorkflowState::Succeeded);
    }

    pub fn fail(&self, reason: impl Into<String>) {
        self.tx.send_replace(WorkflowState::Failed(reason.into()));
    }

    pub fn current(&self) -> WorkflowState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.tx.subscribe()
    }
}
