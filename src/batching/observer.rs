//! # Flush Observability
//!
//! Observers are injected into the dispatcher at construction and notified
//! once per flush, after every submitter of the batch has been handed its
//! outcome. Two implementations ship with the crate:
//!
//! - [`TracingFlushObserver`] emits a structured `tracing` event per flush
//! - [`BatchMetrics`] keeps lock-free counters that can be snapshotted

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// What caused a pending batch to be dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlushTrigger {
    /// Pending operations reached `max_batch_size`
    Size,
    /// `max_wait` elapsed since the batch became non-empty
    Timer,
    /// Every dispatcher handle was dropped
    Shutdown,
}

impl FlushTrigger {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Timer => "timer",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Summary of one executor invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushEvent {
    /// Operations in the batch
    pub operations: usize,
    /// Submissions merged into the batch
    pub submitters: usize,
    pub trigger: FlushTrigger,
    /// Time spent inside the executor
    pub duration: Duration,
    pub succeeded: bool,
}

pub trait FlushObserver: Send + Sync + 'static {
    fn on_flush(&self, event: &FlushEvent);
}

impl<T: FlushObserver + ?Sized> FlushObserver for Arc<T> {
    fn on_flush(&self, event: &FlushEvent) {
        (**self).on_flush(event)
    }
}

/// Logs every flush through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFlushObserver;

impl FlushObserver for TracingFlushObserver {
    fn on_flush(&self, event: &FlushEvent) {
        if event.succeeded {
            debug!(
                operations = event.operations,
                submitters = event.submitters,
                trigger = event.trigger.as_str(),
                duration_ms = u64::try_from(event.duration.as_millis()).unwrap_or(u64::MAX),
                "Batch flushed"
            );
        } else {
            warn!(
                operations = event.operations,
                submitters = event.submitters,
                trigger = event.trigger.as_str(),
                duration_ms = u64::try_from(event.duration.as_millis()).unwrap_or(u64::MAX),
                "Batch flush failed"
            );
        }
    }
}

/// Lock-free flush counters
#[derive(Debug, Default)]
pub struct BatchMetrics {
    batches_flushed: AtomicU64,
    operations_flushed: AtomicU64,
    failed_batches: AtomicU64,
    size_flushes: AtomicU64,
    timer_flushes: AtomicU64,
    shutdown_flushes: AtomicU64,
    total_duration_nanos: AtomicU64,
    largest_batch: AtomicU64,
}

/// Point-in-time copy of [`BatchMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMetricsSnapshot {
    pub batches_flushed: u64,
    pub operations_flushed: u64,
    pub failed_batches: u64,
    pub size_flushes: u64,
    pub timer_flushes: u64,
    pub shutdown_flushes: u64,
    pub total_duration: Duration,
    pub largest_batch: u64,
}

impl BatchMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> BatchMetricsSnapshot {
        BatchMetricsSnapshot {
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            operations_flushed: self.operations_flushed.load(Ordering::Relaxed),
            failed_batches: self.failed_batches.load(Ordering::Relaxed),
            size_flushes: self.size_flushes.load(Ordering::Relaxed),
            timer_flushes: self.timer_flushes.load(Ordering::Relaxed),
            shutdown_flushes: self.shutdown_flushes.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            largest_batch: self.largest_batch.load(Ordering::Relaxed),
        }
    }
}

impl BatchMetricsSnapshot {
    /// Mean operations per flushed batch
    pub fn average_batch_size(&self) -> f64 {
        if self.batches_flushed == 0 {
            0.0
        } else {
            self.operations_flushed as f64 / self.batches_flushed as f64
        }
    }
}

impl FlushObserver for BatchMetrics {
    fn on_flush(&self, event: &FlushEvent) {
        let operations = u64::try_from(event.operations).unwrap_or(u64::MAX);

        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.operations_flushed
            .fetch_add(operations, Ordering::Relaxed);
        self.total_duration_nanos
            .fetch_add(
                u64::try_from(event.duration.as_nanos()).unwrap_or(u64::MAX),
                Ordering::Relaxed,
            );
        self.largest_batch.fetch_max(operations, Ordering::Relaxed);

        if !event.succeeded {
            self.failed_batches.fetch_add(1, Ordering::Relaxed);
        }

        let trigger_counter = match event.trigger {
            FlushTrigger::Size => &self.size_flushes,
            FlushTrigger::Timer => &self.timer_flushes,
            FlushTrigger::Shutdown => &self.shutdown_flushes,
        };
        trigger_counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Fans one flush event out to several observers, in order
#[derive(Default)]
pub struct CompositeFlushObserver {
    observers: Vec<Box<dyn FlushObserver>>,
}

impl CompositeFlushObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl FlushObserver) -> Self {
        self.observers.push(Box::new(observer));
        self
    }
}

impl FlushObserver for CompositeFlushObserver {
    fn on_flush(&self, event: &FlushEvent) {
        for observer in &self.observers {
            observer.on_flush(event);
        }
    }
}
