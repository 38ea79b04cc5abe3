use async_trait::async_trait;
use parking_lot::Mutex;
use people_rw_core::batching::BatchExecutor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Mock executor for testing the dispatcher
/// Records every batch it receives and tracks how many calls overlap
#[derive(Debug)]
pub struct RecordingExecutor<Op> {
    batches: Mutex<Vec<Vec<Op>>>,
    failure: Option<String>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl<Op> RecordingExecutor<Op> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(None, None))
    }

    /// Every batch fails with `message`
    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self::build(Some(message.to_string()), None))
    }

    /// Every batch takes `latency` to execute
    pub fn slow(latency: Duration) -> Arc<Self> {
        Arc::new(Self::build(None, Some(latency)))
    }

    fn build(failure: Option<String>, latency: Option<Duration>) -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            failure,
            latency,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.batches.lock().len()
    }
}

impl<Op: Clone> RecordingExecutor<Op> {
    pub fn batches(&self) -> Vec<Vec<Op>> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl<Op> BatchExecutor<Op> for RecordingExecutor<Op>
where
    Op: Clone + Send + Sync + 'static,
{
    type Error = String;

    async fn execute(&self, operations: &[Op]) -> Result<(), String> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        self.batches.lock().push(operations.to_vec());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.failure {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }
}
