//! # Batch Collector
//!
//! The actor behind a [`BatchDispatcher`](super::BatchDispatcher). It is the
//! sole owner of the pending batch, its completion sinks and the wait
//! deadline; submitters only ever touch the mailbox.
//!
//! Event loop:
//!
//! 1. A submission appends its operations (in order) and its sink.
//! 2. Reaching `max_batch_size` flushes immediately.
//! 3. Otherwise the deadline is armed, but only on the empty → non-empty
//!    transition. Later submissions never push it back, so a steady trickle
//!    below the size threshold cannot starve the flush.
//! 4. The deadline firing flushes whatever is pending.
//!
//! A flush awaits the executor inline, which is what keeps at most one batch
//! in flight. Its single outcome is then cloned into every pending sink in
//! registration order and the state is reset.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, trace};

use super::executor::BatchExecutor;
use super::observer::{FlushEvent, FlushObserver, FlushTrigger};
use super::sink::CompletionSink;
use crate::error::BatchError;

/// One submit call's payload as it travels through the mailbox
#[derive(Debug)]
pub(crate) struct Submission<Op, E> {
    pub(crate) operations: Vec<Op>,
    pub(crate) sink: CompletionSink<E>,
}

/// Operations and sinks accumulated since the last flush
#[derive(Debug)]
pub(crate) struct PendingBatch<Op, E> {
    operations: Vec<Op>,
    sinks: Vec<CompletionSink<E>>,
}

impl<Op, E> PendingBatch<Op, E> {
    pub(crate) fn new() -> Self {
        Self {
            operations: Vec::new(),
            sinks: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.operations.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Merge a submission; returns whether the batch was empty beforehand
    pub(crate) fn push(&mut self, submission: Submission<Op, E>) -> bool {
        let was_empty = self.is_empty();
        self.operations.extend(submission.operations);
        self.sinks.push(submission.sink);
        was_empty
    }

    /// Hand over everything pending, leaving the batch empty
    pub(crate) fn take(&mut self) -> (Vec<Op>, Vec<CompletionSink<E>>) {
        (
            std::mem::take(&mut self.operations),
            std::mem::take(&mut self.sinks),
        )
    }
}

pub(crate) struct BatchCollector<Op, X>
where
    Op: Send + Sync + 'static,
    X: BatchExecutor<Op>,
{
    executor: X,
    observer: Box<dyn FlushObserver>,
    max_batch_size: usize,
    max_wait: Duration,
    mailbox: mpsc::Receiver<Submission<Op, X::Error>>,
    pending: PendingBatch<Op, X::Error>,
    deadline: Option<Instant>,
}

impl<Op, X> BatchCollector<Op, X>
where
    Op: Send + Sync + 'static,
    X: BatchExecutor<Op>,
{
    pub(crate) fn new(
        executor: X,
        observer: Box<dyn FlushObserver>,
        max_batch_size: usize,
        max_wait: Duration,
        mailbox: mpsc::Receiver<Submission<Op, X::Error>>,
    ) -> Self {
        Self {
            executor,
            observer,
            max_batch_size,
            max_wait,
            mailbox,
            pending: PendingBatch::new(),
            deadline: None,
        }
    }

    /// Process events until every dispatcher handle is gone
    pub(crate) async fn run(mut self) {
        debug!(
            max_batch_size = self.max_batch_size,
            max_wait_ms = u64::try_from(self.max_wait.as_millis()).unwrap_or(u64::MAX),
            "Batch collector started"
        );

        loop {
            let deadline = self.deadline;

            tokio::select! {
                message = self.mailbox.recv() => match message {
                    Some(submission) => self.accept(submission).await,
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.flush(FlushTrigger::Timer).await;
                }
            }
        }

        // Submitters whose futures were dropped may still have operations pending
        self.flush(FlushTrigger::Shutdown).await;
        debug!("Batch collector stopped");
    }

    async fn accept(&mut self, submission: Submission<Op, X::Error>) {
        let was_empty = self.pending.push(submission);

        if self.pending.len() >= self.max_batch_size {
            self.flush(FlushTrigger::Size).await;
        } else if was_empty {
            self.deadline = Some(Instant::now() + self.max_wait);
            trace!(pending = self.pending.len(), "Wait deadline armed");
        }
    }

    async fn flush(&mut self, trigger: FlushTrigger) {
        self.deadline = None;

        if self.pending.is_empty() {
            return;
        }

        let (operations, sinks) = self.pending.take();
        let submitters = sinks.len();

        let started = Instant::now();
        let outcome = self
            .executor
            .execute(&operations)
            .await
            .map_err(|e| BatchError::Execution(Arc::new(e)));
        let duration = started.elapsed();

        if let Err(e) = &outcome {
            error!(
                operations = operations.len(),
                submitters,
                trigger = trigger.as_str(),
                error = %e,
                "Got error running batch"
            );
        }

        let succeeded = outcome.is_ok();
        for sink in sinks {
            if !sink.complete(outcome.clone()) {
                trace!("Submitter stopped waiting before its batch completed");
            }
        }

        self.observer.on_flush(&FlushEvent {
            operations: operations.len(),
            submitters,
            trigger,
            duration,
            succeeded,
        });
    }
}
