//! Error types for the ingestion client.

use batchflush::StartError;
use thiserror::Error;

/// Errors surfaced by [`Client`](crate::Client) calls.
///
/// Batch delivery failures are not here: they stay inside the dispatch loop
/// and are only logged.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-layer failure talking to the API
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with something other than 200
    #[error("unexpected status code ({status}), response {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response body did not have the expected shape
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected prompt type: {0}")]
    UnexpectedPromptType(String),

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("prompt role is not system (got `{0}`)")]
    NotSystemPrompt(String),

    /// Missing or malformed client configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Event sending was already started on this client
    #[error(transparent)]
    Start(#[from] StartError),
}

/// Errors from rendering a [`PromptTemplate`](crate::PromptTemplate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("missing value for prompt variable `{0}`")]
    MissingVariable(String),
}
