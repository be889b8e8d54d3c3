use crate::error::DispatchError;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info};

/// Consumer of drained batches.
///
/// Uses native async fn in traits instead of `#[async_trait]`. The handler
/// owns serialization and I/O; the dispatcher only cares whether it succeeded.
///
/// # Note on Object Safety
///
/// This trait uses `impl Future` return types which are not object-safe.
/// For dynamic dispatch, use `Arc<dyn BatchHandlerBoxed<T>>`, which every
/// `BatchHandler<T>` implements.
pub trait BatchHandler<T>: Send + Sync {
    /// Handles one non-empty batch, in enqueue order.
    fn handle(&self, batch: Vec<T>) -> impl Future<Output = Result<(), DispatchError>> + Send;

    /// Returns the handler name used in log fields.
    fn name(&self) -> &str;
}

/// Object-safe version of [`BatchHandler`] for dynamic dispatch.
pub trait BatchHandlerBoxed<T>: Send + Sync {
    /// Handles one batch (boxed future for object safety).
    fn handle_boxed(
        &self,
        batch: Vec<T>,
    ) -> Pin<Box<dyn Future<Output = Result<(), DispatchError>> + Send + '_>>;

    /// Returns the handler name used in log fields.
    fn name(&self) -> &str;
}

/// Blanket implementation: any BatchHandler can be used as BatchHandlerBoxed
impl<T: 'static, H: BatchHandler<T>> BatchHandlerBoxed<T> for H {
    fn handle_boxed(
        &self,
        batch: Vec<T>,
    ) -> Pin<Box<dyn Future<Output = Result<(), DispatchError>> + Send + '_>> {
        Box::pin(self.handle(batch))
    }

    fn name(&self) -> &str {
        BatchHandler::name(self)
    }
}

/// Handler backed by an async closure. Build one with [`handler_fn`].
pub struct FnHandler<F> {
    name: String,
    f: F,
}

/// Wraps an async closure as a [`BatchHandler`].
///
/// ```rust,ignore
/// let handler = handler_fn("stdout", |batch: Vec<String>| async move {
///     println!("{batch:?}");
///     Ok(())
/// });
/// ```
pub fn handler_fn<F>(name: impl Into<String>, f: F) -> FnHandler<F> {
    FnHandler {
        name: name.into(),
        f,
    }
}

impl<T, F, Fut> BatchHandler<T> for FnHandler<F>
where
    F: Fn(Vec<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), DispatchError>> + Send,
{
    fn handle(&self, batch: Vec<T>) -> impl Future<Output = Result<(), DispatchError>> + Send {
        (self.f)(batch)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Logs each batch through `tracing`, for demos and debugging.
pub struct LogHandler {
    verbose: bool,
}

impl LogHandler {
    /// Creates a log handler; `verbose` also logs every item at debug level.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl<T: Debug + Send> BatchHandler<T> for LogHandler {
    async fn handle(&self, batch: Vec<T>) -> Result<(), DispatchError> {
        info!(items = batch.len(), "dispatching batch");
        if self.verbose {
            for (index, item) in batch.iter().enumerate() {
                debug!(index, item = ?item, "batch item");
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Null handler that discards all batches (for benchmarking)
pub struct NullHandler;

impl NullHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> BatchHandler<T> for NullHandler {
    async fn handle(&self, _batch: Vec<T>) -> Result<(), DispatchError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Test handler that records every batch it receives
#[cfg(test)]
pub struct RecordingHandler<T> {
    batches: std::sync::Mutex<Vec<Vec<T>>>,
}

#[cfg(test)]
impl<T: Clone> RecordingHandler<T> {
    pub fn new() -> Self {
        Self {
            batches: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn batches(&self) -> Vec<Vec<T>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }
}

#[cfg(test)]
impl<T: Clone + Send> BatchHandler<T> for RecordingHandler<T> {
    async fn handle(&self, batch: Vec<T>) -> Result<(), DispatchError> {
        self.batches.lock().unwrap().push(batch);
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Test handler that records batches and fails the calls listed in `fail_on`
/// (0-indexed).
#[cfg(test)]
pub struct FlakyHandler<T> {
    fail_on: Vec<usize>,
    calls: std::sync::atomic::AtomicUsize,
    delivered: std::sync::Mutex<Vec<Vec<T>>>,
}

#[cfg(test)]
impl<T: Clone> FlakyHandler<T> {
    pub fn new(fail_on: Vec<usize>) -> Self {
        Self {
            fail_on,
            calls: std::sync::atomic::AtomicUsize::new(0),
            delivered: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<Vec<T>> {
        self.delivered.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl<T: Clone + Send> BatchHandler<T> for FlakyHandler<T> {
    async fn handle(&self, batch: Vec<T>) -> Result<(), DispatchError> {
        let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail_on.contains(&call) {
            return Err(DispatchError::Transport(format!("simulated outage on call {call}")));
        }
        self.delivered.lock().unwrap().push(batch);
        Ok(())
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_null_handler() {
        let handler = NullHandler::new();
        let batch: Vec<u64> = (0..1000).collect();
        assert!(handler.handle(batch).await.is_ok());
    }

    #[tokio::test]
    async fn test_log_handler() {
        let handler = LogHandler::new(true);
        let result = handler.handle(vec!["input", "output"]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_fn_handler_through_boxed_trait() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        let handler: Arc<dyn BatchHandlerBoxed<u32>> = Arc::new(handler_fn(
            "counting",
            move |batch: Vec<u32>| {
                let seen = Arc::clone(&seen_clone);
                async move {
                    seen.fetch_add(batch.len(), Ordering::SeqCst);
                    Ok::<(), DispatchError>(())
                }
            },
        ));

        handler.handle_boxed(vec![1, 2, 3]).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert_eq!(handler.name(), "counting");
    }

    #[tokio::test]
    async fn test_flaky_handler_fails_requested_calls() {
        let handler = FlakyHandler::new(vec![0]);

        assert!(handler.handle(vec![1]).await.is_err());
        assert!(handler.handle(vec![2]).await.is_ok());
        assert_eq!(handler.call_count(), 2);
        assert_eq!(handler.delivered(), vec![vec![2]]);
    }
}
