//! Periodic Batch Flushing
//!
//! A telemetry-batching primitive: application code reports events from any
//! number of threads or tasks into a shared [`Buffer`], and a single
//! background [`PeriodicDispatcher`] drains it on a fixed period and hands
//! every non-empty batch to a caller-supplied [`BatchHandler`].
//!
//! Delivery is best-effort. A batch whose handler fails is logged and
//! dropped, and items still buffered at shutdown are not flushed.
//!
//! ```rust,ignore
//! use batchflush::{Buffer, LogHandler, PeriodicDispatcher};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! let buffer = Arc::new(Buffer::new());
//! let dispatcher = PeriodicDispatcher::new(Arc::clone(&buffer), Arc::new(LogHandler::new(false)));
//! let shutdown = CancellationToken::new();
//! dispatcher.start(shutdown.clone(), Duration::from_secs(5))?;
//!
//! buffer.enqueue("trace-created");
//! ```

pub mod buffer;
pub mod dispatcher;
pub mod error;
pub mod handler;
mod invariants;
pub mod lifecycle;
pub mod metrics;
mod sync;

// Re-export main types
pub use buffer::Buffer;
pub use dispatcher::PeriodicDispatcher;
pub use error::{DispatchError, StartError};
pub use handler::{handler_fn, BatchHandler, BatchHandlerBoxed, FnHandler, LogHandler, NullHandler};
pub use lifecycle::{DispatcherState, Lifecycle};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use tokio_util::sync::CancellationToken;
