//! Langfuse Ingestion Client
//!
//! Records traces and other ingestion events without blocking the caller and
//! ships them to Langfuse in periodic batches, built on
//! [`batchflush::PeriodicDispatcher`]. Also fetches chat system prompts as
//! renderable templates.
//!
//! ```rust,ignore
//! use langfuse_ingest::{CancellationToken, Client, ClientConfig, Trace};
//!
//! let client = Client::new(ClientConfig::from_env()?)?;
//! let shutdown = CancellationToken::new();
//! client.start(shutdown.clone())?;
//!
//! client.trace(Trace::new("What is Rust?", "A systems language").with_name("qa"));
//!
//! let template = client.get_prompt_template("assistant").await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod model;
pub mod prompt;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{ClientError, PromptError};
pub use ingestion::IngestionHandler;
pub use model::{EventBody, IngestionBatch, IngestionEvent, IngestionEventType, PromptMessage, Trace};
pub use prompt::{normalize_placeholders, PromptTemplate};

pub use batchflush::{CancellationToken, DispatchMetrics, MetricsSnapshot};
