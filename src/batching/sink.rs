//! Single-use handoff of one batch outcome to one waiting submitter.

use tokio::sync::oneshot;

use crate::error::{BatchError, BatchResult};

/// Create a connected sink/completion pair for one submission
pub(crate) fn completion_pair<E>() -> (CompletionSink<E>, Completion<E>) {
    let (tx, rx) = oneshot::channel();
    (CompletionSink { tx }, Completion { rx })
}

/// Write side, owned by the collector. Consumed by its only write.
#[derive(Debug)]
pub(crate) struct CompletionSink<E> {
    tx: oneshot::Sender<BatchResult<(), E>>,
}

impl<E> CompletionSink<E> {
    /// Deliver the outcome; `false` when the submitter stopped waiting
    pub(crate) fn complete(self, outcome: BatchResult<(), E>) -> bool {
        self.tx.send(outcome).is_ok()
    }
}

/// Read side, awaited by the submitter
#[derive(Debug)]
pub(crate) struct Completion<E> {
    rx: oneshot::Receiver<BatchResult<(), E>>,
}

impl<E> Completion<E> {
    /// Resolves once the sink is written. A sink dropped unwritten means the
    /// collector is gone.
    pub(crate) async fn wait(self) -> BatchResult<(), E> {
        self.rx.await.unwrap_or(Err(BatchError::DispatcherClosed))
    }
}
