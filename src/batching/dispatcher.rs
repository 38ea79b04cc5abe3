//! Submission entry point for the batch collector.

use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::collector::{BatchCollector, Submission};
use super::executor::BatchExecutor;
use super::observer::{FlushObserver, TracingFlushObserver};
use super::sink::completion_pair;
use crate::config::BatcherConfig;
use crate::error::{BatchError, BatchResult, ConfigurationError};

/// Cloneable handle that coalesces concurrent submissions into batches.
///
/// Every clone feeds the same collector task. The collector keeps running
/// until the last handle is dropped (or [`shutdown`](Self::shutdown)), then
/// flushes anything still pending and exits.
///
/// ```rust,no_run
/// use people_rw_core::batching::{BatchDispatcher, FnExecutor};
/// use people_rw_core::config::BatcherConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = FnExecutor::new(|statements: &[String]| {
///     println!("running {} statements", statements.len());
///     Ok::<_, String>(())
/// });
/// let dispatcher = BatchDispatcher::spawn(BatcherConfig::default(), executor)?;
///
/// dispatcher.submit(vec!["MATCH (n) RETURN n".to_string()]).await?;
/// # Ok(())
/// # }
/// ```
pub struct BatchDispatcher<Op, E> {
    mailbox: mpsc::Sender<Submission<Op, E>>,
    task: Arc<JoinHandle<()>>,
    config: Arc<BatcherConfig>,
}

impl<Op, E> Clone for BatchDispatcher<Op, E> {
    fn clone(&self) -> Self {
        Self {
            mailbox: self.mailbox.clone(),
            task: Arc::clone(&self.task),
            config: Arc::clone(&self.config),
        }
    }
}

impl<Op, E> fmt::Debug for BatchDispatcher<Op, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchDispatcher")
            .field("config", &self.config)
            .field("closed", &self.mailbox.is_closed())
            .finish()
    }
}

impl<Op, E> BatchDispatcher<Op, E>
where
    Op: Send + Sync + 'static,
    E: fmt::Debug + fmt::Display + Send + Sync + 'static,
{
    /// Validate `config` and start a collector that logs its flushes
    pub fn spawn<X>(config: BatcherConfig, executor: X) -> Result<Self, ConfigurationError>
    where
        X: BatchExecutor<Op, Error = E>,
    {
        Self::spawn_with_observer(config, executor, TracingFlushObserver)
    }

    /// Validate `config` and start a collector reporting to `observer`
    ///
    /// Fails without spawning anything when the thresholds are invalid or no
    /// Tokio runtime is available.
    pub fn spawn_with_observer<X, O>(
        config: BatcherConfig,
        executor: X,
        observer: O,
    ) -> Result<Self, ConfigurationError>
    where
        X: BatchExecutor<Op, Error = E>,
        O: FlushObserver,
    {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| ConfigurationError::NoRuntime)?;

        let (mailbox, inbox) = mpsc::channel(config.mailbox_capacity);
        let collector = BatchCollector::new(
            executor,
            Box::new(observer),
            config.max_batch_size,
            config.max_wait(),
            inbox,
        );
        let task = runtime.spawn(collector.run());

        debug!(
            max_batch_size = config.max_batch_size,
            max_wait_ms = config.max_wait_ms,
            mailbox_capacity = config.mailbox_capacity,
            "Batch dispatcher spawned"
        );

        Ok(Self {
            mailbox,
            task: Arc::new(task),
            config: Arc::new(config),
        })
    }

    /// Submit `operations` and wait for the outcome of the batch they land in.
    ///
    /// The operations are dispatched together, in order, as part of exactly
    /// one executor call. Every submitter merged into that call receives the
    /// same outcome. Empty submissions are rejected without reaching the
    /// collector.
    ///
    /// Dropping the returned future after the submission was accepted does not
    /// withdraw it: the operations still run with their batch and the outcome
    /// is discarded.
    pub async fn submit(&self, operations: Vec<Op>) -> BatchResult<(), E> {
        if operations.is_empty() {
            return Err(BatchError::EmptySubmission);
        }

        let (sink, completion) = completion_pair();
        self.mailbox
            .send(Submission { operations, sink })
            .await
            .map_err(|_| BatchError::DispatcherClosed)?;

        completion.wait().await
    }

    pub fn config(&self) -> &BatcherConfig {
        &self.config
    }

    /// Whether the collector has stopped accepting submissions
    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }

    /// Release this handle. When it is the last one, wait for the collector
    /// to flush what is pending and exit.
    pub async fn shutdown(self) -> BatchResult<(), E> {
        let Self { mailbox, task, .. } = self;
        drop(mailbox);

        match Arc::try_unwrap(task) {
            Ok(handle) => handle.await.map_err(|_| BatchError::DispatcherClosed),
            Err(_) => Ok(()),
        }
    }
}
