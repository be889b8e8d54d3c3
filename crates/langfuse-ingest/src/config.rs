//! Configuration for the ingestion client.

use crate::error::ClientError;
use reqwest::Url;
use std::fmt;
use std::time::Duration;

/// Prompt label fetched when none is configured.
pub const DEFAULT_PROMPT_LABEL: &str = "production";

pub const ENV_HOST: &str = "LANGFUSE_HOST";
pub const ENV_PUBLIC_KEY: &str = "LANGFUSE_PUBLIC_KEY";
pub const ENV_SECRET_KEY: &str = "LANGFUSE_SECRET_KEY";
pub const ENV_PROMPT_LABEL: &str = "LANGFUSE_PROMPT_LABEL";

/// Connection and batching settings for a [`Client`](crate::Client).
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the Langfuse API, e.g. `https://cloud.langfuse.com`.
    pub endpoint: String,

    /// Basic-auth user name.
    pub public_key: String,

    /// Basic-auth password. Redacted from `Debug` output.
    pub secret_key: String,

    /// Label selecting which prompt version to fetch.
    ///
    /// Default: `production`
    pub prompt_label: String,

    /// Deadline for a prompt-template fetch.
    ///
    /// Default: 800ms
    pub prompt_timeout: Duration,

    /// Deadline for one ingestion POST.
    ///
    /// Default: 10s
    pub ingestion_timeout: Duration,

    /// Flush period used by [`Client::start`](crate::Client::start).
    ///
    /// Default: 5s
    pub flush_period: Duration,
}

impl ClientConfig {
    /// Creates a configuration with default timeouts and label.
    pub fn new(
        endpoint: impl Into<String>,
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            public_key: public_key.into(),
            secret_key: secret_key.into(),
            prompt_label: DEFAULT_PROMPT_LABEL.to_string(),
            prompt_timeout: Duration::from_millis(800),
            ingestion_timeout: Duration::from_secs(10),
            flush_period: Duration::from_secs(5),
        }
    }

    /// Reads `LANGFUSE_HOST`, `LANGFUSE_PUBLIC_KEY`, `LANGFUSE_SECRET_KEY`
    /// and, optionally, `LANGFUSE_PROMPT_LABEL` from the environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ClientError::Config(format!("{key} is not set")))
        };

        let mut config = Self::new(
            required(ENV_HOST)?,
            required(ENV_PUBLIC_KEY)?,
            required(ENV_SECRET_KEY)?,
        );
        if let Some(label) = lookup(ENV_PROMPT_LABEL).filter(|l| !l.trim().is_empty()) {
            config.prompt_label = label;
        }
        Ok(config)
    }

    pub fn with_prompt_label(mut self, label: impl Into<String>) -> Self {
        self.prompt_label = label.into();
        self
    }

    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    pub fn with_ingestion_timeout(mut self, timeout: Duration) -> Self {
        self.ingestion_timeout = timeout;
        self
    }

    pub fn with_flush_period(mut self, period: Duration) -> Self {
        self.flush_period = period;
        self
    }

    /// Checks the endpoint parses as an http(s) base URL and keys are present.
    pub(crate) fn validate(&self) -> Result<(), ClientError> {
        if self.public_key.is_empty() || self.secret_key.is_empty() {
            return Err(ClientError::Config("public and secret keys are required".into()));
        }
        if self.prompt_label.is_empty() {
            return Err(ClientError::Config("prompt label must not be empty".into()));
        }
        let url = self.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "endpoint scheme must be http or https, got `{}`",
                url.scheme()
            )));
        }
        Ok(())
    }

    fn base_url(&self) -> Result<Url, ClientError> {
        Url::parse(&self.endpoint)
            .map_err(|e| ClientError::Config(format!("invalid endpoint `{}`: {e}", self.endpoint)))
    }

    /// Joins `segments` onto the endpoint path, percent-encoding each one.
    pub(crate) fn api_url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url()?;
        url.path_segments_mut()
            .map_err(|()| ClientError::Config(format!("endpoint `{}` cannot be a base URL", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .field("prompt_label", &self.prompt_label)
            .field("prompt_timeout", &self.prompt_timeout)
            .field("ingestion_timeout", &self.ingestion_timeout)
            .field("flush_period", &self.flush_period)
            .finish()
    }
}
