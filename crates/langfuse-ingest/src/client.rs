use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::ingestion::IngestionHandler;
use crate::model::{EventBody, IngestionEvent, IngestionEventType, PromptMessage, PromptResponse, Trace};
use crate::prompt::PromptTemplate;
use batchflush::{Buffer, CancellationToken, DispatchMetrics, PeriodicDispatcher};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

const SYSTEM_ROLE: &str = "system";
const CHAT_PROMPT_TYPE: &str = "chat";

/// Langfuse client: buffers ingestion events for periodic batched delivery
/// and fetches system-prompt templates.
///
/// Recording an event never blocks on the network. Events are sent only after
/// [`start_sending_events`](Self::start_sending_events) (or [`start`](Self::start))
/// has been called, and whatever is still buffered at shutdown is discarded.
pub struct Client {
    http: reqwest::Client,
    config: ClientConfig,
    dispatcher: PeriodicDispatcher<IngestionEvent>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().build()?;
        Self::with_http_client(http, config)
    }

    /// Builds a client sharing an existing connection pool.
    pub fn with_http_client(http: reqwest::Client, config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let handler = IngestionHandler::new(http.clone(), &config)?;
        let dispatcher = PeriodicDispatcher::new(Arc::new(Buffer::new()), Arc::new(handler));

        Ok(Self {
            http,
            config,
            dispatcher,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Starts the background sender, flushing every `period` until `shutdown`
    /// is cancelled. Can succeed at most once per client.
    pub fn start_sending_events(
        &self,
        shutdown: CancellationToken,
        period: Duration,
    ) -> Result<JoinHandle<()>, ClientError> {
        Ok(self.dispatcher.start(shutdown, period)?)
    }

    /// [`start_sending_events`](Self::start_sending_events) with the
    /// configured flush period.
    pub fn start(&self, shutdown: CancellationToken) -> Result<JoinHandle<()>, ClientError> {
        self.start_sending_events(shutdown, self.config.flush_period)
    }

    /// Records a `trace-create` event.
    pub fn trace(&self, trace: Trace) {
        self.enqueue(IngestionEvent::trace(trace));
    }

    /// Records an event of any kind with a raw JSON body.
    pub fn submit(&self, kind: IngestionEventType, body: Value) {
        self.enqueue(IngestionEvent::new(kind, EventBody::Json(body)));
    }

    pub fn enqueue(&self, event: IngestionEvent) {
        self.dispatcher.enqueue(event);
    }

    /// Events recorded but not yet handed to the sender.
    pub fn pending_events(&self) -> usize {
        self.dispatcher.buffer().len()
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        self.dispatcher.metrics()
    }

    /// Fetches the configured label of chat prompt `name` and returns its
    /// system message as a normalized template.
    #[instrument(skip(self), fields(label = %self.config.prompt_label))]
    pub async fn get_prompt_template(&self, name: &str) -> Result<PromptTemplate, ClientError> {
        let mut url = self.config.api_url(&["api", "public", "v2", "prompts", name])?;
        url.query_pairs_mut()
            .append_pair("label", &self.config.prompt_label);

        let response = self
            .http
            .get(url)
            .basic_auth(&self.config.public_key, Some(&self.config.secret_key))
            .timeout(self.config.prompt_timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let prompt: PromptResponse = serde_json::from_str(&body)?;
        if prompt.kind != CHAT_PROMPT_TYPE {
            return Err(ClientError::UnexpectedPromptType(prompt.kind));
        }

        let messages: Vec<PromptMessage> = if prompt.prompt.is_null() {
            Vec::new()
        } else {
            serde_json::from_value(prompt.prompt)?
        };
        let first = messages.into_iter().next().ok_or(ClientError::EmptyPrompt)?;
        if first.role != SYSTEM_ROLE {
            return Err(ClientError::NotSystemPrompt(first.role));
        }

        let name = if prompt.name.is_empty() { name.to_string() } else { prompt.name };
        debug!(prompt = %name, version = ?prompt.version, "fetched prompt template");
        Ok(PromptTemplate::new(name, prompt.version, &first.content))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("state", &self.dispatcher.state())
            .field("pending_events", &self.pending_events())
            .finish_non_exhaustive()
    }
}
