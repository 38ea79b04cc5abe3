//! The executor seam: whatever performs a flushed batch against the backing store.

use async_trait::async_trait;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Executes one flushed batch atomically and reports a single outcome.
///
/// The collector awaits `execute` inline, so an implementation is never
/// invoked concurrently with itself by the same dispatcher.
#[async_trait]
pub trait BatchExecutor<Op>: Send + Sync + 'static
where
    Op: Send + Sync + 'static,
{
    type Error: fmt::Debug + fmt::Display + Send + Sync + 'static;

    async fn execute(&self, operations: &[Op]) -> Result<(), Self::Error>;
}

#[async_trait]
impl<Op, T> BatchExecutor<Op> for Arc<T>
where
    Op: Send + Sync + 'static,
    T: BatchExecutor<Op> + ?Sized,
{
    type Error = T::Error;

    async fn execute(&self, operations: &[Op]) -> Result<(), Self::Error> {
        (**self).execute(operations).await
    }
}

/// Adapts a synchronous closure into a [`BatchExecutor`]
///
/// The closure runs on the collector task; a slow closure stalls the
/// collector (and therefore every waiting submitter) for its duration.
pub struct FnExecutor<F, E> {
    func: F,
    _error: PhantomData<fn() -> E>,
}

impl<F, E> FnExecutor<F, E> {
    pub fn new(func: F) -> Self {
        Self {
            func,
            _error: PhantomData,
        }
    }
}

impl<F, E> fmt::Debug for FnExecutor<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExecutor").finish_non_exhaustive()
    }
}

#[async_trait]
impl<Op, F, E> BatchExecutor<Op> for FnExecutor<F, E>
where
    Op: Send + Sync + 'static,
    F: Fn(&[Op]) -> Result<(), E> + Send + Sync + 'static,
    E: fmt::Debug + fmt::Display + Send + Sync + 'static,
{
    type Error = E;

    async fn execute(&self, operations: &[Op]) -> Result<(), E> {
        (self.func)(operations)
    }
}
