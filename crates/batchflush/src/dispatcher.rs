//! Periodic Dispatcher - Single-Consumer Flush Loop
//!
//! [`PeriodicDispatcher`] owns the recurring drain-and-dispatch cycle over a
//! shared [`Buffer`]. Producers only ever call `enqueue`; the loop spawned by
//! [`PeriodicDispatcher::start`] is the only caller of `drain`.
//!
//! # Tick
//!
//! Every `period` the loop drains the buffer. A non-empty batch is handed to
//! the handler; an empty one is skipped without calling anything. Handler
//! failures (and panics) are logged, counted in [`DispatchMetrics`], and the
//! batch is dropped. Nothing is retried or re-queued.
//!
//! # Lifecycle
//!
//! ```text
//! ┌──────┐  start()  ┌─────────┐  cancellation  ┌─────────┐
//! │ Idle │ ────────► │ Running │ ─────────────► │ Stopped │
//! └──────┘           └─────────┘                └─────────┘
//! ```
//!
//! Exactly one `start` succeeds per instance, decided by a compare-and-swap
//! on the state. Cancellation is observed between ticks; a handler call in
//! progress always runs to completion. Items still buffered when the loop
//! stops are not flushed.

use crate::buffer::Buffer;
use crate::error::{DispatchError, StartError};
use crate::handler::BatchHandlerBoxed;
use crate::invariants::debug_assert_batch_not_empty;
use crate::lifecycle::{DispatcherState, Lifecycle};
use crate::metrics::DispatchMetrics;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Drains a shared buffer on a fixed period and forwards each non-empty
/// batch to a handler.
pub struct PeriodicDispatcher<T> {
    buffer: Arc<Buffer<T>>,
    handler: Arc<dyn BatchHandlerBoxed<T>>,
    lifecycle: Arc<Lifecycle>,
    metrics: Arc<DispatchMetrics>,
}

impl<T: Send + 'static> PeriodicDispatcher<T> {
    /// Creates an idle dispatcher over `buffer`.
    ///
    /// Uses `BatchHandlerBoxed` so any [`BatchHandler`](crate::BatchHandler)
    /// can be passed as `Arc<dyn BatchHandlerBoxed<T>>`.
    pub fn new(buffer: Arc<Buffer<T>>, handler: Arc<dyn BatchHandlerBoxed<T>>) -> Self {
        Self {
            buffer,
            handler,
            lifecycle: Arc::new(Lifecycle::new()),
            metrics: Arc::new(DispatchMetrics::default()),
        }
    }

    /// Appends an item to the underlying buffer.
    #[inline]
    pub fn enqueue(&self, item: T) {
        self.buffer.enqueue(item);
    }

    /// Returns the shared buffer producers enqueue into.
    pub fn buffer(&self) -> &Arc<Buffer<T>> {
        &self.buffer
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> DispatcherState {
        self.lifecycle.state()
    }

    /// Returns dispatch metrics, updated by the loop as it runs.
    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Spawns the flush loop on the current Tokio runtime.
    ///
    /// The loop ticks every `period` until `shutdown` is cancelled. Returns
    /// immediately with the loop's `JoinHandle`; awaiting it is optional.
    ///
    /// Fails with [`StartError::AlreadyStarted`] if this instance was started
    /// before, even if that loop has since stopped. A zero or unschedulable
    /// `period` and a missing runtime are rejected without consuming the
    /// activation.
    pub fn start(
        &self,
        shutdown: CancellationToken,
        period: Duration,
    ) -> Result<JoinHandle<()>, StartError> {
        if period.is_zero() {
            return Err(StartError::ZeroPeriod);
        }
        let runtime = Handle::try_current().map_err(|_| StartError::NoRuntime)?;
        // The timer must be able to represent the first deadline and the one after it
        let now = Instant::now();
        if now.checked_add(period.saturating_mul(2)).is_none() {
            return Err(StartError::PeriodTooLong);
        }
        // First tick one full period after start, not immediately
        let first_tick = now + period;

        self.lifecycle.try_start()?;

        let flush_loop = FlushLoop {
            buffer: Arc::clone(&self.buffer),
            handler: Arc::clone(&self.handler),
            lifecycle: Arc::clone(&self.lifecycle),
            metrics: Arc::clone(&self.metrics),
        };
        Ok(runtime.spawn(flush_loop.run(shutdown, first_tick, period)))
    }
}

/// State moved into the spawned task.
struct FlushLoop<T> {
    buffer: Arc<Buffer<T>>,
    handler: Arc<dyn BatchHandlerBoxed<T>>,
    lifecycle: Arc<Lifecycle>,
    metrics: Arc<DispatchMetrics>,
}

impl<T: Send + 'static> FlushLoop<T> {
    async fn run(self, shutdown: CancellationToken, first_tick: Instant, period: Duration) {
        let mut ticker = interval_at(first_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            handler = self.handler.name(),
            period_ms = period.as_millis() as u64,
            "dispatch loop started"
        );

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.tick().await;
        }

        self.lifecycle.stop();

        let pending = self.buffer.len();
        if pending > 0 {
            warn!(
                handler = self.handler.name(),
                pending,
                "dispatch loop stopped, pending items were not flushed"
            );
        } else {
            info!(handler = self.handler.name(), "dispatch loop stopped");
        }
    }

    async fn tick(&self) {
        let batch = self.buffer.drain();
        self.metrics.record_tick(batch.is_empty());
        if batch.is_empty() {
            return;
        }
        debug_assert_batch_not_empty!(batch);

        let item_count = batch.len() as u64;
        // The handler call itself may panic before returning a future
        let outcome = AssertUnwindSafe(async { self.handler.handle_boxed(batch).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(DispatchError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(()) => {
                self.metrics.record_success(item_count);
                debug!(handler = self.handler.name(), items = item_count, "batch dispatched");
            }
            Err(e) => {
                self.metrics.record_failure(item_count);
                error!(
                    handler = self.handler.name(),
                    items = item_count,
                    error = %e,
                    transient = e.is_transient(),
                    "batch dispatch failed, dropping batch"
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
