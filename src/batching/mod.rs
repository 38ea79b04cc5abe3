//! # Batching Dispatcher
//!
//! Coalesces operations submitted concurrently by many callers into ordered
//! batches and runs each batch through a single [`BatchExecutor`] call.
//!
//! ```text
//! submit([A, B]) ──┐
//! submit([C])    ──┼──> mailbox ──> BatchCollector ──> executor([A, B, C]) ──> outcome to all
//! submit([D])    ──┘                (size / max_wait)
//! ```
//!
//! - [`BatchDispatcher`] is the cloneable submission handle
//! - [`BatchExecutor`] is the seam to whatever performs a batch
//! - [`FlushObserver`] receives one [`FlushEvent`] per executor call
//!
//! The collector task owns all pending state; the mailbox is the only
//! structure shared between threads.

mod collector;
mod dispatcher;
mod executor;
mod observer;
mod sink;

pub use dispatcher::BatchDispatcher;
pub use executor::{BatchExecutor, FnExecutor};
pub use observer::{
    BatchMetrics, BatchMetricsSnapshot, CompositeFlushObserver, FlushEvent, FlushObserver,
    FlushTrigger, TracingFlushObserver,
};
