//! Fan-in of task completions to the coordinator.
//!
//! Every spawned task owns a [`CompletionSignal`]. The signal fires exactly
//! once: explicitly with the task's report, or from `Drop` if the task ends
//! without reporting (panic or abort). The coordinator waits on the receiving
//! side instead of probing task liveness.

use tokio::sync::mpsc;
use twin_migrate_types::ModelReport;

/// A task reached a terminal state.
#[derive(Debug)]
pub struct Completion {
    pub index: usize,
    /// `None` when the task ended without producing a report.
    pub report: Option<ModelReport>,
}

/// Hands out completion signals; dropping it lets the waiter observe when
/// every outstanding signal is gone.
pub struct CompletionTracker {
    tx: mpsc::UnboundedSender<Completion>,
}

impl CompletionTracker {
    pub fn new() -> (Self, CompletionWaiter) {
        let (tx, rx) = mpsc::unbounded_channel();
        (CompletionTracker { tx }, CompletionWaiter { rx })
    }

    pub fn signal(&self, index: usize) -> CompletionSignal {
        CompletionSignal {
            index,
            tx: Some(self.tx.clone()),
        }
    }
}

pub struct CompletionSignal {
    index: usize,
    tx: Option<mpsc::UnboundedSender<Completion>>,
}

impl CompletionSignal {
    pub fn complete(mut self, report: ModelReport) {
        self.fire(Some(report));
    }

    fn fire(&mut self, report: Option<ModelReport>) {
        if let Some(tx) = self.tx.take() {
            // The waiter may already be gone; nobody is left to tell.
            let _ = tx.send(Completion {
                index: self.index,
                report,
            });
        }
    }
}

impl Drop for CompletionSignal {
    fn drop(&mut self) {
        self.fire(None);
    }
}

pub struct CompletionWaiter {
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl CompletionWaiter {
    /// Next completion, or `None` once every signal (and the tracker) is gone.
    pub async fn next(&mut self) -> Option<Completion> {
        self.rx.recv().await
    }
}
