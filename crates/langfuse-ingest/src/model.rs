//! Wire types for the Langfuse ingestion and prompt APIs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Kind of an ingestion event, serialized in kebab-case (`trace-create`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IngestionEventType {
    TraceCreate,
    GenerationCreate,
    GenerationUpdate,
    ScoreCreate,
    SpanCreate,
    SpanUpdate,
    EventCreate,
}

/// Payload carried by an [`IngestionEvent`].
///
/// Traces stay typed until the batch is encoded; anything else is raw JSON.
/// Outbound only: the untagged encoding cannot tell the variants apart again.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventBody {
    Trace(Trace),
    Json(Value),
}

/// One entry in an ingestion batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionEvent {
    /// Fresh UUIDv4, assigned at creation.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: IngestionEventType,
    pub body: EventBody,
}

impl IngestionEvent {
    /// Wraps `body` with a new id and the current time.
    pub fn new(kind: IngestionEventType, body: EventBody) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
            body,
        }
    }

    pub fn trace(trace: Trace) -> Self {
        Self::new(IngestionEventType::TraceCreate, EventBody::Trace(trace))
    }
}

/// Request body of `POST /api/public/ingestion`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionBatch {
    pub batch: Vec<IngestionEvent>,
}

/// Partial-success report returned with status 207.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct IngestionResponse {
    #[serde(default)]
    pub errors: Vec<Value>,
}

/// A Langfuse trace. Unset fields are left out of the encoded body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub public: bool,
}

impl Trace {
    pub fn new(input: impl Into<Value>, output: impl Into<Value>) -> Self {
        Self {
            input: Some(input.into()),
            output: Some(output.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, metadata: impl Into<Value>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Marks the trace as publicly viewable.
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }
}

/// Response of `GET /api/public/v2/prompts/{name}`.
///
/// `prompt` is kept raw: chat prompts carry a message list, text prompts a
/// plain string.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PromptResponse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub prompt: Value,
}

/// One message of a chat prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}
